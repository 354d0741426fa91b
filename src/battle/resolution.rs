//! Action resolver
//!
//! Turns a raw damage/heal number into an applied change. Damage passes
//! through a fixed pipeline:
//! evasion/deflection -> shield charge -> defending stance -> slow/weaken -> HP clamp.
//! Guaranteed (focus) hits skip everything but the clamp.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::Combatant;
use crate::battle::log::{AnimationKind, BattleLog, LogKind};
use crate::battle::status::{Affliction, ApplyResult};
use crate::core::types::{GaugeKind, Side, Turn};

/// What kind of change a resolution applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionKind {
    Damage,
    Heal,
    Evaded,
    Deflected,
    Shielded,
    Backfire,
    Gauge(GaugeKind),
    Status,
}

/// Structured result of one resolved effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub target: Side,
    pub amount: u32,
    pub kind: ResolutionKind,
    pub target_defeated: bool,
}

/// A damaging hit about to be resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub raw: u32,
    /// Focus attacks bypass evasion, shields, defending and slows
    pub guaranteed: bool,
    /// Attacks can backfire under delayed-backfire; item/status damage cannot
    pub is_attack: bool,
    pub animation: AnimationKind,
}

impl Hit {
    pub fn strike(raw: u32) -> Self {
        Self {
            raw,
            guaranteed: false,
            is_attack: true,
            animation: AnimationKind::Strike,
        }
    }

    pub fn guaranteed(raw: u32) -> Self {
        Self {
            raw,
            guaranteed: true,
            is_attack: true,
            animation: AnimationKind::Special,
        }
    }

    pub fn item(raw: u32) -> Self {
        Self {
            raw,
            guaranteed: false,
            is_attack: false,
            animation: AnimationKind::Item,
        }
    }
}

/// Raw basic-attack damage: roll minus the target's flat armor, at least 1
pub fn mitigate_armor(roll: u32, armor: u32) -> u32 {
    roll.saturating_sub(armor).max(1)
}

/// Scale by a percentage multiplier, rounding down
pub fn scale(amount: u32, multiplier: f32) -> u32 {
    (amount as f32 * multiplier.max(0.0)).floor() as u32
}

/// Resolve a hit from `actor` onto `target`
pub fn resolve_hit<R: Rng>(
    actor: &mut Combatant,
    target: &mut Combatant,
    hit: Hit,
    rng: &mut R,
    log: &mut BattleLog,
    turn: Turn,
) -> Resolution {
    // Delayed backfire converts the attack into self-damage
    if hit.is_attack && actor.statuses.take_backfire() {
        let lost = actor.hp.drain(hit.raw);
        log.push(
            turn,
            LogKind::Backfire,
            format!("{} overthinks it and takes {} damage instead!", actor.name, lost),
        );
        log.animate(hit.animation, actor.side, lost);
        return Resolution {
            target: actor.side,
            amount: lost,
            kind: ResolutionKind::Backfire,
            target_defeated: actor.is_dead(),
        };
    }

    let mut damage = hit.raw;

    if !hit.guaranteed {
        // (1) evasion / deflection
        let capabilities = target.enemy.as_ref().map(|e| e.capabilities);
        if let Some(capabilities) = capabilities {
            if let Some(chance) = capabilities.evasion {
                if rng.gen_bool(chance.clamp(0.0, 1.0)) {
                    log.push(turn, LogKind::Evaded, format!("{} evades the attack!", target.name));
                    log.animate(AnimationKind::Miss, target.side, 0);
                    return Resolution {
                        target: target.side,
                        amount: 0,
                        kind: ResolutionKind::Evaded,
                        target_defeated: target.is_dead(),
                    };
                }
            }
            if let Some(chance) = capabilities.deflection {
                if rng.gen_bool(chance.clamp(0.0, 1.0)) {
                    let lost = actor.hp.drain(damage);
                    log.push(
                        turn,
                        LogKind::Deflected,
                        format!(
                            "{} deflects the blow back at {} for {} damage!",
                            target.name, actor.name, lost
                        ),
                    );
                    log.animate(AnimationKind::Deflect, actor.side, lost);
                    return Resolution {
                        target: actor.side,
                        amount: lost,
                        kind: ResolutionKind::Deflected,
                        target_defeated: actor.is_dead(),
                    };
                }
            }
        }

        // (2) shield charge
        if target.statuses.consume_shield() {
            log.push(
                turn,
                LogKind::Shielded,
                format!(
                    "{}'s shield absorbs the hit ({} charges left)",
                    target.name,
                    target.statuses.shield_charges()
                ),
            );
            log.animate(AnimationKind::ShieldBlock, target.side, 0);
            return Resolution {
                target: target.side,
                amount: 0,
                kind: ResolutionKind::Shielded,
                target_defeated: target.is_dead(),
            };
        }

        // (3) defending stance drains the defense gauge 1:1
        if target.is_defending {
            let absorbed = target.defense.drain(damage);
            if absorbed > 0 {
                damage -= absorbed;
                log.push(
                    turn,
                    LogKind::Absorbed,
                    format!("{} blocks {} damage", target.name, absorbed),
                );
            }
        }

        // (4) slow / weaken on the attacker
        let reduction = actor.statuses.outgoing_reduction_percent();
        if reduction > 0 {
            damage = damage * (100 - reduction) / 100;
        }
    }

    // (5) clamp
    let lost = target.hp.drain(damage);
    log.push(
        turn,
        LogKind::Damage,
        format!("{} takes {} damage", target.name, lost),
    );
    log.animate(hit.animation, target.side, lost);
    tracing::debug!(raw = hit.raw, applied = lost, target = ?target.side, "hit resolved");

    Resolution {
        target: target.side,
        amount: lost,
        kind: ResolutionKind::Damage,
        target_defeated: target.is_dead(),
    }
}

/// Heal `target`, reporting the post-clamp amount
pub fn resolve_heal(target: &mut Combatant, amount: u32, log: &mut BattleLog, turn: Turn) -> Resolution {
    let healed = target.hp.add(amount);
    log.push(
        turn,
        LogKind::Heal,
        format!("{} recovers {} HP", target.name, healed),
    );
    log.animate(AnimationKind::Heal, target.side, healed);
    Resolution {
        target: target.side,
        amount: healed,
        kind: ResolutionKind::Heal,
        target_defeated: target.is_dead(),
    }
}

/// Raise (positive) or lower (negative) one of `target`'s gauges
pub fn resolve_gauge(
    target: &mut Combatant,
    gauge: GaugeKind,
    delta: i64,
    log: &mut BattleLog,
    turn: Turn,
) -> Resolution {
    let pool = match gauge {
        GaugeKind::Attack => Some(&mut target.attack),
        GaugeKind::Defense => Some(&mut target.defense),
        GaugeKind::Focus => target.focus.as_mut(),
    };

    let applied = match pool {
        Some(pool) if delta >= 0 => pool.add(delta.min(u32::MAX as i64) as u32),
        Some(pool) => pool.drain(delta.unsigned_abs().min(u32::MAX as u64) as u32),
        None => 0,
    };

    let verb = if delta >= 0 { "rises" } else { "drops" };
    log.push(
        turn,
        LogKind::Gauge,
        format!("{}'s {:?} gauge {} by {}", target.name, gauge, verb, applied),
    );

    Resolution {
        target: target.side,
        amount: applied,
        kind: ResolutionKind::Gauge(gauge),
        target_defeated: target.is_dead(),
    }
}

/// Attach a timed status to `target`
pub fn resolve_status(
    target: &mut Combatant,
    affliction: Affliction,
    duration: u32,
    log: &mut BattleLog,
    turn: Turn,
) -> Resolution {
    let kind = affliction.kind();
    let verb = match target.statuses.apply(affliction, duration) {
        ApplyResult::Applied => "is afflicted with",
        ApplyResult::Refreshed => "feels renewed",
    };
    log.push(
        turn,
        LogKind::StatusApplied,
        format!("{} {} {} ({} turns)", target.name, verb, kind.label(), duration),
    );
    log.animate(AnimationKind::Status, target.side, duration);

    Resolution {
        target: target.side,
        amount: duration,
        kind: ResolutionKind::Status,
        target_defeated: target.is_dead(),
    }
}
