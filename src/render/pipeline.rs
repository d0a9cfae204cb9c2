use crate::error::Result;
use crate::event::PipelineStatus;
use crate::notification::{Color, Notification, NotificationField};
use crate::payload::Field;
use crate::render::parse_timestamp;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

impl PipelineStatus {
    fn color(self) -> Color {
        match self {
            PipelineStatus::Pending => Color::Blue,
            PipelineStatus::Running => Color::Indigo,
            PipelineStatus::Success => Color::BrightGreen,
            PipelineStatus::Failed => Color::Red,
        }
    }

    /// Which `object_attributes` timestamp the message is dated by
    fn timestamp_key(self) -> &'static str {
        match self {
            PipelineStatus::Pending | PipelineStatus::Running => "created_at",
            PipelineStatus::Success | PipelineStatus::Failed => "finished_at",
        }
    }
}

fn build_lines(builds: &[Field<'_>], status: PipelineStatus) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(builds.len() + 1);
    lines.push(match status {
        PipelineStatus::Pending => format!("This pipeline has {} build(s):", builds.len()),
        PipelineStatus::Running | PipelineStatus::Success => "Pipeline update:".to_string(),
        PipelineStatus::Failed => "Pipeline failed:".to_string(),
    });

    for build in builds {
        let name = build.get("name").str()?;
        let build_status = build.get("status").str()?;
        let line = match status {
            PipelineStatus::Pending => format!("- Build `{}`: `{}`", name, build_status),
            _ => format!(
                "- Build `{}`: Stage `{}` / Status `{}`",
                name,
                build.get("stage").str()?,
                build_status
            ),
        };
        lines.push(line);
    }
    Ok(lines)
}

/// Download links for every build that kept an artifact archive
fn artifact_fields(builds: &[Field<'_>], web_url: &str) -> Result<Vec<NotificationField>> {
    let mut fields = Vec::new();
    for build in builds {
        let artifacts = build.get("artifacts_file");
        if !artifacts.get("filename").is_present() {
            continue;
        }

        let url = format!(
            "{}/-/jobs/{}/artifacts/download",
            web_url,
            build.get("id").display()?
        );
        let size_mib = artifacts.get("size").u64()? as f64 / BYTES_PER_MIB;
        fields.push(NotificationField {
            title: format!("Artifact for {}", build.get("name").str()?),
            value: format!("<{}|Download ({:.2} MiB)>", url, size_mib),
            short: false,
        });
    }
    Ok(fields)
}

pub fn render(body: &Field<'_>, status: PipelineStatus) -> Result<Notification> {
    let project = body.get("project");
    let repo_name = project.get("path_with_namespace").str()?;
    let web_url = project.get("web_url").str()?;
    let attributes = body.get("object_attributes");
    let pipeline_id = attributes.get("id").display()?;
    let user = body.get("user");
    let author_name = user.get("username").str()?;
    let timestamp = parse_timestamp(&attributes.get(status.timestamp_key()))?;

    let builds = body.get("builds").items();
    let text = build_lines(&builds, status)?.join("\n");
    let fields = match status {
        PipelineStatus::Success => artifact_fields(&builds, web_url)?,
        _ => Vec::new(),
    };

    Ok(Notification {
        title: format!("Pipeline for {}", repo_name),
        title_link: Some(format!("{}/pipelines/{}", web_url, pipeline_id)),
        text,
        timestamp,
        author_name: author_name.to_string(),
        author_icon: user.get("avatar_url").opt_str().map(String::from),
        color: status.color(),
        fields,
    })
}
