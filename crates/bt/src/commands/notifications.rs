//! `bt notifications` -- the session inbox of the acting user.

use anyhow::{Result, bail};

use crate::cli::{NotificationCommands, NotificationsArgs};
use crate::context::RuntimeContext;
use crate::output::{format_notification, output_json};

pub fn run(ctx: &RuntimeContext, args: &NotificationsArgs) -> Result<()> {
    let session = ctx.session()?;
    const LIST: NotificationCommands = NotificationCommands::List { unread: false };
    match args.command.as_ref().unwrap_or(&LIST) {
        NotificationCommands::List { unread } => {
            let mut inbox = session.sync.cache().notifications.get();
            if *unread {
                inbox.retain(|n| !n.is_read);
            }
            if ctx.json {
                output_json(&inbox);
            } else if inbox.is_empty() {
                println!("No notifications.");
            } else {
                let dates = session.user().settings.date_format;
                for notification in &inbox {
                    println!("{}", format_notification(notification, dates));
                }
            }
        }
        NotificationCommands::Read { id, unread } => {
            let is_read = !unread;
            if !session.sync.mark_notification(*id, is_read)? {
                bail!("notification {id} not found");
            }
            if ctx.json {
                output_json(&serde_json::json!({ "id": id, "isRead": is_read }));
            } else if !ctx.quiet {
                println!("Marked notification {} {}", id, if is_read { "read" } else { "unread" });
            }
        }
        NotificationCommands::Sync => {
            session.sync.sync_notifications()?;
            if ctx.json {
                output_json(&serde_json::json!({ "synced": true }));
            } else if !ctx.quiet {
                println!("Notifications synced.");
            }
        }
    }
    Ok(())
}
