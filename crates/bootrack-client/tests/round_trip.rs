//! Client against a live server on an ephemeral port.

use std::net::TcpListener;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use bootrack_client::{ClientApi, HttpClient, Synchronizer};
use bootrack_core::change::FieldChange;
use bootrack_core::comment::Comment;
use bootrack_core::enums::{IssueState, NotificationType, RankBy, Toggle};
use bootrack_core::issue::IssueBuilder;
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use bootrack_server::AppState;
use bootrack_storage::SqliteStore;
use pretty_assertions::assert_eq;

struct Running {
    base_url: String,
    handle: ServerHandle,
    thread: Option<JoinHandle<()>>,
    project: Project,
    ann: User,
    bob: User,
}

impl Drop for Running {
    fn drop(&mut self) {
        actix_web::rt::System::new().block_on(self.handle.stop(true));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn user(username: &str, full_name: &str, project: &Project) -> User {
    User {
        id: 0,
        full_name: full_name.into(),
        username: username.into(),
        settings: UserSettings::defaults_for(project.clone()),
    }
}

fn start() -> Running {
    let state = AppState::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
    let project = state
        .repo()
        .add_project(&Project::new("Ghost Town", "GHST").unwrap())
        .unwrap();
    let ann = state.repo().add_user(&user("ann", "Ann Example", &project)).unwrap();
    let bob = state.repo().add_user(&user("bob", "Bob Example", &project)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    let thread = thread::spawn(move || {
        actix_web::rt::System::new().block_on(async move {
            let server = bootrack_server::serve(state, listener, Some(1)).unwrap();
            tx.send(server.handle()).unwrap();
            let _ = server.await;
        });
    });
    let handle = rx.recv().unwrap();

    Running {
        base_url,
        handle,
        thread: Some(thread),
        project,
        ann,
        bob,
    }
}

fn client(running: &Running) -> HttpClient {
    HttpClient::new(&running.base_url, Duration::from_secs(5))
}

#[test]
fn cursor_header_names_agree() {
    assert_eq!(bootrack_client::NEXT_CURSOR_HEADER, bootrack_server::NEXT_CURSOR_HEADER);
}

#[test]
fn listing_paging_and_cursor_batches() {
    let running = start();
    let sync = Synchronizer::new(client(&running), running.ann.clone());
    sync.load_initial().unwrap();
    assert_eq!(sync.cache().issue_count.get(), 0);

    let mut created = Vec::new();
    for i in 0..12 {
        let draft = IssueBuilder::new(running.project.id, 0, format!("Crash number {i}")).build();
        created.push(sync.create_issue(draft).unwrap());
    }
    assert_eq!(created[0].code, "GHST-100");
    assert_eq!(sync.cache().issue_count.get(), 12);
    assert_eq!(sync.cache().summaries.get()[0].issue.code, "GHST-111");

    sync.load_project(&running.project).unwrap();
    assert_eq!(sync.cache().summaries.get().len(), 10);
    assert_eq!(sync.load_page(2).unwrap().len(), 2);

    assert_eq!(sync.prefetch_all(running.project.id, 5).unwrap(), 12);
    let mut codes: Vec<String> = sync
        .cache()
        .summaries
        .get()
        .into_iter()
        .map(|s| s.issue.code)
        .collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 12);

    let newest = sync.show_issue_at(running.project.id, 0).unwrap().unwrap();
    assert_eq!(newest.issue.code, "GHST-111");
    assert!(sync.show_issue_at(running.project.id, 12).unwrap().is_none());
}

#[test]
fn mutations_round_trip() {
    let running = start();
    let api = client(&running);
    let sync = Synchronizer::new(client(&running), running.ann.clone());
    sync.load_initial().unwrap();

    let issue = sync
        .create_issue(
            IssueBuilder::new(running.project.id, 0, "Login button broken")
                .description("Clicking login does nothing")
                .build(),
        )
        .unwrap();
    assert_eq!(issue.watchers, vec![running.ann.id]);

    // Silent upvote toggle, applied twice, is a no-op on the server.
    let upvoted = sync.toggle(&issue, Toggle::Upvotes).unwrap();
    assert_eq!(upvoted.upvotes, vec![running.ann.id]);
    let cleared = sync.toggle(&upvoted, Toggle::Upvotes).unwrap();
    assert!(cleared.upvotes.is_empty());

    // Comment with a mention reaches bob's session.
    let comment = sync
        .add_comment(Comment::draft(
            issue.project_id,
            issue.number,
            0,
            "@bob can you reproduce?",
        ))
        .unwrap();
    let summary = sync.cache().find_summary(&issue.code).unwrap();
    assert_eq!(summary.comment_count, 1);
    let inbox = api.get_notifications(running.bob.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message, NotificationType::Mentioned.message());
    assert_eq!(inbox[0].issue_code, issue.code);
    assert!(api.edit_notification(inbox[0].id, true).unwrap());
    api.sync_notifications().unwrap();

    // Search finds it until it is closed and resolved issues are hidden.
    assert_eq!(sync.filter(&running.project, "login", true).unwrap(), 1);
    let closed = sync
        .update_issue(&cleared, FieldChange::State(IssueState::Completed))
        .unwrap();
    assert_eq!(closed.state, IssueState::Completed);
    assert_eq!(api.count_issues(running.project.id, Some("login"), true).unwrap(), 0);
    let ranked = sync.rank(running.project.id, RankBy::Open).unwrap();
    assert!(ranked.iter().flatten().all(|s| s.issue.code != issue.code));

    assert!(sync.delete_comment(&comment).unwrap());
    let detailed = api.get_issue(issue.project_id, issue.number).unwrap().unwrap();
    assert!(detailed.comments.is_empty());

    assert!(sync.delete_issue(&closed).unwrap());
    assert!(api.get_issue(issue.project_id, issue.number).unwrap().is_none());
    assert!(!api.delete_issue(issue.project_id, issue.number).unwrap());
    let err = api.edit_issue(issue.project_id, &closed).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}
