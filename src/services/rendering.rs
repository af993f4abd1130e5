//! Message rendering.
//!
//! Every function here is pure. Per-event log messages are chosen from a
//! lookup table keyed by event name; events without a dedicated template use
//! [`render_generic`].

use crate::domain::models::{EventKind, NotificationRecord};

/// Everything a log message template may display.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Event kind.
    pub kind: &'a EventKind,
    /// Resolved title.
    pub title: &'a str,
    /// Task identifier.
    pub task_id: Option<&'a str>,
    /// Translated status.
    pub status: &'a str,
    /// Designer or comment author.
    pub author: Option<&'a str>,
    /// Message or comment body.
    pub message: Option<&'a str>,
    /// Task tags.
    pub tags: &'a [String],
    /// Link to the task in Deskfy.
    pub task_url: Option<&'a str>,
}

/// A log message template.
pub type RenderFn = fn(&MessageContext<'_>) -> String;

const TEMPLATES: &[(&str, RenderFn)] = &[
    ("NEW_TASK", render_new_task),
    ("UPDATE_TASK", render_update_task),
    ("NEW_TASK_COMMENT", render_new_comment),
    ("UPDATE_BRIEFING", render_briefing_update),
];

/// Template registered for `kind`, or the generic one.
pub fn template_for(kind: &EventKind) -> RenderFn {
    TEMPLATES
        .iter()
        .find(|(name, _)| *name == kind.as_str())
        .map_or(render_generic as RenderFn, |(_, render)| *render)
}

/// Render the log message for an event.
pub fn render_event(ctx: &MessageContext<'_>) -> String {
    template_for(ctx.kind)(ctx)
}

/// Render the card shown in the list channel.
///
/// Absent or empty fields are left out entirely.
pub fn render_card(record: &NotificationRecord) -> String {
    let mut lines = Vec::with_capacity(5);
    if let Some(title) = non_empty(Some(&record.title)) {
        lines.push(format!("*{title}*"));
    }
    if let Some(id) = record.correlation_id() {
        lines.push(format!("ID: {id}"));
    }
    if let Some(status) = non_empty(Some(&record.status)) {
        lines.push(format!("Status: *{status}*"));
    }
    if let Some(author) = non_empty(record.designer_or_author.as_deref()) {
        lines.push(format!("Designer: {author}"));
    }
    if let Some(message) = non_empty(record.message.as_deref()) {
        lines.push(format!("Message: {message}"));
    }
    lines.join("\n")
}

/// Substitute `{task_id}` into the task URL template.
pub fn task_url(template: &str, task_id: Option<&str>) -> Option<String> {
    let id = task_id?;
    if template.trim().is_empty() {
        return None;
    }
    Some(template.replace("{task_id}", id))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn tags_line(tags: &[String]) -> String {
    if tags.is_empty() {
        "*Tags:* No tags".to_string()
    } else {
        format!("*Tags:* {}", tags.join(", "))
    }
}

fn link_line(url: Option<&str>) -> Option<String> {
    url.map(|url| format!("🔗 <{url}|Open task>"))
}

fn assemble(lines: Vec<Option<String>>) -> String {
    lines.into_iter().flatten().collect::<Vec<_>>().join("\n")
}

fn render_new_task(ctx: &MessageContext<'_>) -> String {
    assemble(vec![
        Some("🆕 *New task created!*".to_string()),
        Some(format!("*Title:* {}", ctx.title)),
        Some(format!("*Status:* {}", ctx.status)),
        Some(tags_line(ctx.tags)),
        link_line(ctx.task_url),
    ])
}

fn render_update_task(ctx: &MessageContext<'_>) -> String {
    assemble(vec![
        Some("🔄 *Task updated!*".to_string()),
        Some(format!("*Title:* {}", ctx.title)),
        Some(format!("*New status:* {}", ctx.status)),
        Some(tags_line(ctx.tags)),
        link_line(ctx.task_url),
    ])
}

fn render_new_comment(ctx: &MessageContext<'_>) -> String {
    assemble(vec![
        Some("💬 *New comment on task!*".to_string()),
        Some(format!("*Title:* {}", ctx.title)),
        Some(format!("*Author:* {}", non_empty(ctx.author).unwrap_or("Someone"))),
        Some(format!(
            "*Comment:* {}",
            non_empty(ctx.message).unwrap_or("(no content)")
        )),
        Some(tags_line(ctx.tags)),
        link_line(ctx.task_url),
    ])
}

fn render_briefing_update(ctx: &MessageContext<'_>) -> String {
    assemble(vec![
        Some("📝 *Briefing updated!*".to_string()),
        Some(format!("*Title:* {}", ctx.title)),
        Some(tags_line(ctx.tags)),
        link_line(ctx.task_url),
    ])
}

/// Template for events without a dedicated one.
pub fn render_generic(ctx: &MessageContext<'_>) -> String {
    assemble(vec![
        Some(format!("*{}*", ctx.title)),
        ctx.task_id.map(|id| format!("ID: {id}")),
        Some(format!("Status: *{}*", ctx.status)),
        non_empty(ctx.author).map(|author| format!("Designer: {author}")),
        Some(format!("Action: {}", ctx.kind)),
        Some(format!("Message: {}", non_empty(ctx.message).unwrap_or("-"))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(kind: &'a EventKind, tags: &'a [String]) -> MessageContext<'a> {
        MessageContext {
            kind,
            title: "Banner A",
            task_id: Some("42"),
            status: "In review",
            author: Some("Ana"),
            message: Some("Looks good"),
            tags,
            task_url: Some("https://app.deskfy.io/r/42"),
        }
    }

    #[test]
    fn test_card_omits_absent_fields() {
        let record = NotificationRecord::new(Some("42".to_string()), "Banner A", "In progress");
        assert_eq!(render_card(&record), "*Banner A*\nID: 42\nStatus: *In progress*");

        let record = record
            .with_author(Some("Ana".to_string()))
            .with_message(Some("  ".to_string()));
        assert_eq!(
            render_card(&record),
            "*Banner A*\nID: 42\nStatus: *In progress*\nDesigner: Ana"
        );
    }

    #[test]
    fn test_template_lookup() {
        let tags = vec!["GEO RJ".to_string(), "Urgent".to_string()];
        let kind = EventKind::NewTask;
        let text = render_event(&context(&kind, &tags));
        assert!(text.starts_with("🆕 *New task created!*"));
        assert!(text.contains("*Tags:* GEO RJ, Urgent"));
        assert!(text.ends_with("🔗 <https://app.deskfy.io/r/42|Open task>"));

        let kind = EventKind::NewTaskComment;
        let text = render_event(&context(&kind, &[]));
        assert!(text.contains("*Author:* Ana"));
        assert!(text.contains("*Comment:* Looks good"));
        assert!(text.contains("*Tags:* No tags"));
    }

    #[test]
    fn test_unknown_event_uses_generic_template() {
        let kind = EventKind::from("TASK_MOVED");
        let mut ctx = context(&kind, &[]);
        ctx.message = None;
        assert_eq!(
            render_event(&ctx),
            "*Banner A*\nID: 42\nStatus: *In review*\nDesigner: Ana\nAction: TASK_MOVED\nMessage: -"
        );
    }

    #[test]
    fn test_task_url() {
        assert_eq!(
            task_url("https://x/?request={task_id}", Some("9")).as_deref(),
            Some("https://x/?request=9")
        );
        assert_eq!(task_url("https://x/{task_id}", None), None);
        assert_eq!(task_url("", Some("9")), None);
    }
}
