use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FlowPointRole {
    Source,
    Intermediate,
    Sink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPoint {
    pub role: FlowPointRole,
    pub code: String,
    pub variable: String,
    pub file: String,
    #[serde(default)]
    pub remarks: String,
}

/// A Source→…→Sink ordered sequence of program points, extracted from the last
/// `<FLOW>…</FLOW>` block in a FlowReasoning transcript. Treated as opaque text by every
/// downstream consumer; `points` is only populated when a caller chooses to parse it, the raw
/// `<FLOW>` body is what actually gets woven back into later prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    pub raw: String,
    pub points: Vec<FlowPoint>,
}

impl Flow {
    /// Validates the §3 invariant: exactly one Source (first), exactly one Sink (last), all
    /// others Intermediate.
    pub fn validate(points: &[FlowPoint]) -> Result<(), CoreError> {
        match points {
            [] => Err(CoreError::EmptyFlow),
            [single] => Err(CoreError::MalformedFlow(format!(
                "flow has only one point with role {:?}, need a distinct Source and Sink",
                single.role
            ))),
            _ => {
                let first = &points[0];
                let last = &points[points.len() - 1];
                if first.role != FlowPointRole::Source {
                    return Err(CoreError::MalformedFlow(
                        "first flow point must have role Source".to_string(),
                    ));
                }
                if last.role != FlowPointRole::Sink {
                    return Err(CoreError::MalformedFlow(
                        "last flow point must have role Sink".to_string(),
                    ));
                }
                if points[1..points.len() - 1]
                    .iter()
                    .any(|p| p.role != FlowPointRole::Intermediate)
                {
                    return Err(CoreError::MalformedFlow(
                        "flow points between Source and Sink must have role Intermediate"
                            .to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn from_points(raw: impl Into<String>, points: Vec<FlowPoint>) -> Result<Self, CoreError> {
        Self::validate(&points)?;
        Ok(Self {
            raw: raw.into(),
            points,
        })
    }

    pub fn opaque(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            points: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(role: FlowPointRole) -> FlowPoint {
        FlowPoint {
            role,
            code: "x".to_string(),
            variable: "v".to_string(),
            file: "f.py".to_string(),
            remarks: String::new(),
        }
    }

    #[test]
    fn valid_flow_passes() {
        let points = vec![
            point(FlowPointRole::Source),
            point(FlowPointRole::Intermediate),
            point(FlowPointRole::Sink),
        ];
        assert!(Flow::validate(&points).is_ok());
    }

    #[test]
    fn two_point_flow_with_source_then_sink_passes() {
        let points = vec![point(FlowPointRole::Source), point(FlowPointRole::Sink)];
        assert!(Flow::validate(&points).is_ok());
    }

    #[test]
    fn empty_flow_rejected() {
        assert!(matches!(Flow::validate(&[]), Err(CoreError::EmptyFlow)));
    }

    #[test]
    fn single_point_flow_rejected() {
        let points = vec![point(FlowPointRole::Source)];
        assert!(matches!(Flow::validate(&points), Err(CoreError::MalformedFlow(_))));
    }

    #[test]
    fn wrong_first_role_rejected() {
        let points = vec![
            point(FlowPointRole::Intermediate),
            point(FlowPointRole::Sink),
        ];
        assert!(Flow::validate(&points).is_err());
    }

    #[test]
    fn wrong_last_role_rejected() {
        let points = vec![
            point(FlowPointRole::Source),
            point(FlowPointRole::Intermediate),
        ];
        assert!(Flow::validate(&points).is_err());
    }

    #[test]
    fn sink_in_middle_rejected() {
        let points = vec![
            point(FlowPointRole::Source),
            point(FlowPointRole::Sink),
            point(FlowPointRole::Sink),
        ];
        assert!(Flow::validate(&points).is_err());
    }
}
