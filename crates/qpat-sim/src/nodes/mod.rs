//! Network nodes: groups of components addressed by name.
//!
//! A node owns no components itself; it records the arena ids of the
//! components it was built from and exposes the methods tasks may call.

pub mod analyzer;
pub mod source;

use qpat_experiment::{ParamValue, Params};

use crate::error::{SimError, SimResult};

pub use analyzer::{AnalyzerBasis, AnalyzerConfig, PolarizationAnalyzer};
pub use source::{SourceConfig, SourceNode};

/// A node method call resolved from a task, ready to run on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCall {
    /// Fire source pulses.
    Emit {
        /// Number of pulses.
        num_pulses: u64,
    },
    /// Rotate the analyzer's quarter-wave plate (rad).
    SetQwpAngle(f64),
    /// Rotate the analyzer's half-wave plate (rad).
    SetHwpAngle(f64),
    /// Apply a measurement-basis preset.
    SetBasis(AnalyzerBasis),
}

impl NodeCall {
    /// Name of the node method this call runs.
    pub fn method(&self) -> &'static str {
        match self {
            NodeCall::Emit { .. } => "emit",
            NodeCall::SetQwpAngle(_) => "set_qwp_angle",
            NodeCall::SetHwpAngle(_) => "set_hwp_angle",
            NodeCall::SetBasis(_) => "set_basis",
        }
    }
}

/// A built node.
pub enum SimNode {
    /// Entangled-pair source.
    Source(SourceNode),
    /// Polarization analyzer.
    Analyzer(PolarizationAnalyzer),
}

/// Positional-or-keyword argument extraction for one call.
struct CallArgs<'a> {
    node: &'a str,
    method: &'a str,
    args: &'a [ParamValue],
    kwargs: &'a Params,
}

impl<'a> CallArgs<'a> {
    fn invalid(&self, reason: impl Into<String>) -> SimError {
        SimError::InvalidArgument {
            node: self.node.to_string(),
            method: self.method.to_string(),
            reason: reason.into(),
        }
    }

    /// The single argument, given either positionally or as `keyword`.
    fn single(&self, keywords: &[&str]) -> SimResult<&'a ParamValue> {
        let keyword = keywords
            .iter()
            .find_map(|k| self.kwargs.get_key_value(*k));
        if let Some((unknown, _)) = self
            .kwargs
            .iter()
            .find(|(k, _)| !keywords.contains(&k.as_str()))
        {
            return Err(self.invalid(format!("unexpected keyword argument '{unknown}'")));
        }
        match (self.args, keyword) {
            ([value], None) => Ok(value),
            ([], Some((_, value))) => Ok(value),
            ([], None) => Err(self.invalid(format!("missing argument '{}'", keywords[0]))),
            ([_], Some((k, _))) => Err(self.invalid(format!("argument '{k}' given twice"))),
            (many, _) => Err(self.invalid(format!("expected 1 argument, got {}", many.len()))),
        }
    }

    fn number(&self, keywords: &[&str]) -> SimResult<f64> {
        let value = self.single(keywords)?;
        value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(format!("expected a number, got {} '{value}'", value.kind())))
    }

    fn count(&self, keywords: &[&str]) -> SimResult<u64> {
        let value = self.number(keywords)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(self.invalid(format!("expected a non-negative integer, got {value}")));
        }
        Ok(value as u64)
    }

    fn text(&self, keywords: &[&str]) -> SimResult<&'a str> {
        let value = self.single(keywords)?;
        value
            .as_str()
            .ok_or_else(|| self.invalid(format!("expected a string, got {} '{value}'", value.kind())))
    }
}

impl SimNode {
    /// Node name.
    pub fn name(&self) -> &str {
        match self {
            SimNode::Source(n) => &n.name,
            SimNode::Analyzer(n) => &n.name,
        }
    }

    /// Methods a task may schedule on this node.
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            SimNode::Source(_) => &["emit"],
            SimNode::Analyzer(_) => &["set_qwp_angle", "set_hwp_angle", "set_basis"],
        }
    }

    /// Turn a method name plus arguments into a typed call.
    ///
    /// Nothing is executed; argument errors surface here so a batch of
    /// tasks can be validated before any of it is scheduled.
    pub fn resolve_call(
        &self,
        method: &str,
        args: &[ParamValue],
        kwargs: &Params,
    ) -> SimResult<NodeCall> {
        let call = CallArgs {
            node: self.name(),
            method,
            args,
            kwargs,
        };
        match (self, method) {
            (SimNode::Source(_), "emit") => Ok(NodeCall::Emit {
                num_pulses: call.count(&["num_pulses"])?,
            }),
            (SimNode::Analyzer(_), "set_qwp_angle") => {
                Ok(NodeCall::SetQwpAngle(call.number(&["theta", "theta_rad"])?))
            }
            (SimNode::Analyzer(_), "set_hwp_angle") => {
                Ok(NodeCall::SetHwpAngle(call.number(&["theta", "theta_rad"])?))
            }
            (SimNode::Analyzer(_), "set_basis") => {
                Ok(NodeCall::SetBasis(call.text(&["basis"])?.parse()?))
            }
            _ => Err(SimError::MissingMethod {
                node: self.name().to_string(),
                method: method.to_string(),
            }),
        }
    }
}
