use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::notification::{Color, Notification};
use crate::payload::Field;

/// Split `refs/heads/release` into ("branch", "release") and
/// `refs/tags/v1.0` into ("tag", "v1.0").
fn describe_ref(git_ref: &str) -> (&'static str, &str) {
    let mut segments = git_ref.splitn(3, '/');
    let _refs = segments.next();
    let namespace = segments.next();
    let word = if namespace == Some("heads") { "branch" } else { "tag" };
    let name = segments
        .next()
        .unwrap_or_else(|| git_ref.rsplit('/').next().unwrap_or(git_ref));
    (word, name)
}

pub fn render(body: &Field<'_>, received_at: DateTime<Utc>) -> Result<Notification> {
    let user_name = body.get("user_name").str()?;
    let git_ref = body.get("ref").str()?;
    let project = body.get("project");
    let repo_name = project.get("path_with_namespace").str()?;
    let web_url = project.get("web_url").str()?;
    let checkout_sha = body.get("checkout_sha").str()?;

    let (word, name) = describe_ref(git_ref);
    let sha_url = format!("{}/commit/{}", web_url, checkout_sha);

    Ok(Notification {
        title: format!("{} created {} {} on {}", user_name, word, name, repo_name),
        title_link: Some(web_url.to_string()),
        text: format!("Points to `<{}|{}>`", sha_url, checkout_sha),
        timestamp: received_at,
        author_name: user_name.to_string(),
        author_icon: body.get("user_avatar").opt_str().map(String::from),
        color: Color::Teal,
        fields: Vec::new(),
    })
}
