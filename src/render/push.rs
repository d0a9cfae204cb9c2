use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::notification::{Color, Notification};
use crate::payload::Field;
use crate::render::first_line;

/// Length of the abbreviated commit id shown in the message
const SHORT_SHA_LEN: usize = 6;

/// Paths touched by a push, merged over all of its commits
#[derive(Debug, Default)]
struct Changes<'a> {
    added: BTreeSet<&'a str>,
    modified: BTreeSet<&'a str>,
    removed: BTreeSet<&'a str>,
}

impl<'a> Changes<'a> {
    fn record(&mut self, commit: &Field<'a>) {
        self.added.extend(commit.get("added").strings());
        self.modified.extend(commit.get("modified").strings());
        self.removed.extend(commit.get("removed").strings());
    }

    fn lines(&self) -> [String; 3] {
        [
            path_line("A:", &self.added),
            path_line("E:", &self.modified),
            path_line("R:", &self.removed),
        ]
    }
}

fn path_line(prefix: &str, paths: &BTreeSet<&str>) -> String {
    let mut line = prefix.to_string();
    for path in paths {
        line.push_str(" `");
        line.push_str(path);
        line.push('`');
    }
    line
}

pub fn render(body: &Field<'_>, received_at: DateTime<Utc>) -> Result<Notification> {
    let username = body.get("user_username").str()?;
    let git_ref = body.get("ref").str()?;
    let project = body.get("project");
    let repo_name = project.get("path_with_namespace").str()?;

    let commits = body.get("commits").items();
    let commit_count = body
        .get("total_commits_count")
        .opt_u64()
        .unwrap_or(commits.len() as u64);

    let mut lines = Vec::with_capacity(commits.len() + 5);
    let mut changes = Changes::default();
    for commit in &commits {
        let id = commit.get("id").str()?;
        let url = commit.get("url").str()?;
        let message = commit.get("message").str()?;
        let short_id: String = id.chars().take(SHORT_SHA_LEN).collect();
        lines.push(format!("`<{}|{}>` {}", url, short_id, first_line(message)));
        changes.record(commit);
    }

    lines.push(String::new());
    lines.push("Changes:".to_string());
    lines.extend(changes.lines());

    Ok(Notification {
        title: format!(
            "{} pushed {} commit(s) to {} @ {}",
            username, commit_count, git_ref, repo_name
        ),
        title_link: project.get("web_url").opt_str().map(String::from),
        text: lines.join("\n"),
        timestamp: received_at,
        author_name: username.to_string(),
        author_icon: body.get("user_avatar").opt_str().map(String::from),
        color: Color::Green,
        fields: Vec::new(),
    })
}
