//! Gameplay roles of static bodies and how the actor reacts on contact.

use crate::config::LevelConfig;
use crate::ir_map::Properties;
use macroquad::prelude::*;

/// Semantic role attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoleTag {
    /// Scenery; no gameplay reaction.
    #[default]
    Plain,
    /// Touching it loses the level.
    Hazard,
    /// Pushes the actor away.
    Bumper,
    /// Touching it wins the level.
    Goal,
}

/// Role from a body's properties. Hazard beats bumper beats goal when a tile
/// sets more than one flag.
pub fn classify(props: &Properties, config: &LevelConfig) -> RoleTag {
    let flag = |name: &str| props.get_bool(name).unwrap_or(false);
    if flag(&config.hazard_property) {
        RoleTag::Hazard
    } else if flag(&config.bumper_property) {
        RoleTag::Bumper
    } else if flag(&config.goal_property) {
        RoleTag::Goal
    } else {
        RoleTag::Plain
    }
}

/// What the game loop should do after the actor touches a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEffect {
    /// Nothing happens.
    None,
    /// The level is lost.
    Lose,
    /// The level is won.
    Win,
    /// Impulse to apply to the actor.
    Impulse(Vec2),
}

/// Centres of the two bodies in a contact, in world pixels (Y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Position of the level body.
    pub body_center: Vec2,
    /// Position of the actor.
    pub actor_center: Vec2,
}

/// Reaction to the actor touching a body with `role`.
pub fn contact_effect(role: RoleTag, contact: Contact, config: &LevelConfig) -> ContactEffect {
    match role {
        RoleTag::Plain => ContactEffect::None,
        RoleTag::Hazard => ContactEffect::Lose,
        RoleTag::Goal => ContactEffect::Win,
        RoleTag::Bumper => {
            let away = contact.actor_center - contact.body_center;
            // Dead-centre hit: push straight up.
            let dir = if away.length_squared() > 0.0 {
                away.normalize()
            } else {
                vec2(0.0, -1.0)
            };
            ContactEffect::Impulse(dir * config.bumper_impulse)
        }
    }
}
