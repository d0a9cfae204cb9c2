//! Classification of incoming GitLab hooks

use serde_json::Value;
use std::str::FromStr;

use crate::error::{RelayError, Result};
use crate::payload::Field;

/// Header GitLab uses to declare the event type
pub const EVENT_HEADER: &str = "X-Gitlab-Event";

/// Every GitLab event label ends with this word, e.g. "Tag Push Hook"
const HOOK_SUFFIX: &str = "hook";

/// Event kind as declared by the sender, before any payload inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Push,
    TagPush,
    Pipeline,
}

/// Lifecycle phases of a pipeline that produce a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl FromStr for PipelineStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PipelineStatus::Pending),
            "running" => Ok(PipelineStatus::Running),
            "success" => Ok(PipelineStatus::Success),
            "failed" => Ok(PipelineStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Fully resolved event, one per renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Push,
    TagPush,
    Pipeline(PipelineStatus),
}

/// Outcome of resolving a hook against its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Render(EventKind),
    /// Pipeline status with no renderer (canceled, skipped, created...)
    Ignored { status: String },
}

/// Map an `X-Gitlab-Event` label to a hook kind.
///
/// The label is trimmed and must end with "Hook" (any case); what is left,
/// trimmed and lower-cased, must name a known hook.
pub fn classify(label: Option<&str>) -> Result<HookKind> {
    let unknown = || RelayError::UnknownEvent {
        label: label.map(str::to_string),
    };

    let trimmed = label.ok_or_else(unknown)?.trim();
    let split = trimmed
        .len()
        .checked_sub(HOOK_SUFFIX.len())
        .filter(|&idx| trimmed.is_char_boundary(idx))
        .ok_or_else(unknown)?;
    let (name, suffix) = trimmed.split_at(split);
    if !suffix.eq_ignore_ascii_case(HOOK_SUFFIX) {
        return Err(unknown());
    }

    match name.trim().to_lowercase().as_str() {
        "push" => Ok(HookKind::Push),
        "tag push" => Ok(HookKind::TagPush),
        "pipeline" => Ok(HookKind::Pipeline),
        _ => Err(unknown()),
    }
}

impl EventKind {
    /// Second classification stage: pipelines are split by
    /// `object_attributes.status`.
    pub fn resolve(hook: HookKind, body: &Value) -> Result<Resolved> {
        let kind = match hook {
            HookKind::Push => EventKind::Push,
            HookKind::TagPush => EventKind::TagPush,
            HookKind::Pipeline => {
                let status = Field::root(body)
                    .get("object_attributes")
                    .get("status")
                    .str()?;
                match status.parse::<PipelineStatus>() {
                    Ok(status) => EventKind::Pipeline(status),
                    Err(()) => {
                        return Ok(Resolved::Ignored {
                            status: status.to_string(),
                        });
                    }
                }
            }
        };
        Ok(Resolved::Render(kind))
    }
}
