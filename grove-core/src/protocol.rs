//! Messages exchanged between a host and the simulation.
//!
//! The JSON shape matches what a browser-style host sends and reads:
//!
//! ```json
//! {"type": "init", "width": 800, "height": 600}
//! {"type": "update", "timestamp": 1234.5}
//! {"type": "draw", "particles": [{"x": 400.0, "y": 565.2, "treeIndex": 0, ...}],
//!  "connections": [{"a": 0, "b": 1, "distSq": 12.5}], "maxDistance": 33.0}
//! ```

use crate::connections::Connection;
use crate::error::ProtocolError;
use crate::particle::Particle;
use serde::{Deserialize, Serialize};

/// A host request. `init` and `resize` both reset the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    Init { width: f32, height: f32 },
    Resize { width: f32, height: f32 },
    Update { timestamp: f64 },
}

impl Command {
    pub fn is_reset(&self) -> bool {
        matches!(self, Command::Init { .. } | Command::Resize { .. })
    }
}

/// Everything a renderer needs to draw one tick.
///
/// Connections index into `particles`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub particles: Vec<Particle>,
    pub connections: Vec<Connection>,
    pub max_distance: f32,
}

/// A simulation response.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reply {
    Draw(Frame),
}

impl Reply {
    pub fn into_frame(self) -> Frame {
        match self {
            Reply::Draw(frame) => frame,
        }
    }
}

/// Parses a JSON command, rejecting unusable canvas sizes.
pub fn decode_command(text: &str) -> Result<Command, ProtocolError> {
    let cmd: Command = serde_json::from_str(text)?;
    if let Command::Init { width, height } | Command::Resize { width, height } = cmd
        && !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
    {
        return Err(ProtocolError::InvalidSize { width, height });
    }
    Ok(cmd)
}

pub fn encode_reply(reply: &Reply) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Population;
    use crate::particle::Sprout;
    use glam::Vec2;

    #[test]
    fn decodes_host_commands() {
        assert_eq!(
            decode_command(r#"{"type":"init","width":800,"height":600}"#).unwrap(),
            Command::Init {
                width: 800.0,
                height: 600.0
            }
        );
        assert_eq!(
            decode_command(r#"{"type":"resize","width":1024.5,"height":768}"#).unwrap(),
            Command::Resize {
                width: 1024.5,
                height: 768.0
            }
        );
        assert_eq!(
            decode_command(r#"{"type":"update","timestamp":16.7}"#).unwrap(),
            Command::Update { timestamp: 16.7 }
        );
    }

    #[test]
    fn rejects_garbled_and_unknown_commands() {
        for text in [
            "",
            "not json",
            r#"{"type":"explode"}"#,
            r#"{"type":"update"}"#,
            r#"{"width":1,"height":1}"#,
        ] {
            assert!(
                matches!(decode_command(text), Err(ProtocolError::Json(_))),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn rejects_degenerate_canvas_sizes() {
        let err = decode_command(r#"{"type":"init","width":0,"height":600}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSize { .. }));
    }

    #[test]
    fn draw_reply_is_tagged_with_camel_case_fields() {
        let reply = Reply::Draw(Frame {
            particles: Vec::new(),
            connections: Vec::new(),
            max_distance: 33.0,
        });
        let json: serde_json::Value =
            serde_json::from_str(&encode_reply(&reply).unwrap()).unwrap();

        assert_eq!(json["type"], "draw");
        assert_eq!(json["maxDistance"], 33.0);
        assert!(json["particles"].as_array().unwrap().is_empty());
    }

    #[test]
    fn draw_reply_carries_flat_particles() {
        let mut population = Population::new();
        for x in [100.0, 110.0] {
            population.allocate(Sprout {
                pos: Vec2::new(x, 50.0),
                density: 0.8,
                hue: 220.0,
                phase: 0.0,
                wave_magnitude: 2.0,
                movement_scale: 2.0,
                branch_level: 1,
                tree: 3,
            });
        }
        let reply = Reply::Draw(Frame {
            particles: population.particles().to_vec(),
            connections: vec![Connection {
                a: 0,
                b: 1,
                dist_sq: 100.0,
            }],
            max_distance: 33.0,
        });
        let json: serde_json::Value =
            serde_json::from_str(&encode_reply(&reply).unwrap()).unwrap();

        let p = &json["particles"][1];
        for key in [
            "x",
            "y",
            "originalX",
            "originalY",
            "density",
            "hue",
            "index",
            "phase",
            "waveMagnitude",
            "movementScale",
            "branchLevel",
            "treeIndex",
            "birthOrder",
        ] {
            assert!(p.get(key).is_some(), "particle is missing {key}");
        }
        assert_eq!(p["x"], 110.0);
        assert_eq!(p["treeIndex"], 3);
        assert_eq!(p["birthOrder"], 1);
        assert_eq!(json["connections"][0]["a"], 0);
        assert_eq!(json["connections"][0]["distSq"], 100.0);
    }

    #[test]
    fn reset_commands_are_flagged() {
        assert!(Command::Init { width: 1.0, height: 1.0 }.is_reset());
        assert!(Command::Resize { width: 1.0, height: 1.0 }.is_reset());
        assert!(!Command::Update { timestamp: 0.0 }.is_reset());
    }
}
