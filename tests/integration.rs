use std::path::PathBuf;

use assert_cmd::Command;
use atom_syndication::Feed;
use httpmock::prelude::*;
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    server: MockServer,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            server: MockServer::start(),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("wods.db")
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let db = self.db_path();
        Command::cargo_bin("wodfeed")
            .unwrap()
            .args(args)
            .arg("--db")
            .arg(&db)
            .env("BTWB_TOKEN", "test-token")
            .env("WODFEED_SOURCE_URL", self.server.url("/wods"))
            .assert()
    }

    fn mock_schedule(&self, body: &str) -> httpmock::Mock<'_> {
        let body = body.to_string();
        self.server.mock(move |when, then| {
            when.method(GET)
                .path("/wods")
                .header("Accept", "application/vnd.btwb.v1.webwidgets+json")
                .header("Authorization", "test-token");
            then.status(200)
                .header("Content-Type", "application/vnd.btwb.v1.webwidgets+json")
                .body(&body);
        })
    }

    fn sync(&self) {
        self.run(&["sync"]).success();
    }

    fn render(&self) -> Feed {
        let output = self.run(&["render"]).success().get_output().stdout.clone();
        Feed::read_from(&output[..]).unwrap()
    }

    fn render_bytes(&self) -> Vec<u8> {
        self.run(&["render"]).success().get_output().stdout.clone()
    }
}

fn workout(section: &str, name: &str, description: &str) -> String {
    format!(
        r#"{{"wod_section": "{section}", "wod_title": null,
            "workout": {{"workout_name": "{name}", "workout_description": "{description}",
                         "wod_results_url": null, "wod_results_count": null}}}}"#
    )
}

fn day_group(date: &str, workouts: &[String]) -> String {
    format!(
        r#"{{"date": "{date}", "entries": [{}]}}"#,
        workouts.join(",")
    )
}

fn batch(groups: &[String]) -> String {
    format!(r#"{{"wodsets": [{}]}}"#, groups.join(","))
}

fn two_date_batch(second_run_description: &str) -> String {
    batch(&[
        day_group("2025-01-05", &[workout("strength", "Deadlift", "5x5")]),
        day_group(
            "2025-01-12",
            &[
                workout("metcon", "Run", second_run_description),
                workout("recovery", "Rest", "Mobility work"),
            ],
        ),
    ])
}

#[test]
fn test_sync_then_render_end_to_end() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&two_date_batch("5k easy pace"));

    ctx.sync();
    let feed = ctx.render();

    assert_eq!(feed.entries().len(), 2);
    // Oldest first.
    assert_eq!(feed.entries()[0].title().as_str(), "Workout for Sun Jan 5, 2025");
    assert_eq!(feed.entries()[1].title().as_str(), "Workout for Sun Jan 12, 2025");

    let second = feed.entries()[1].content().unwrap().value().unwrap().to_string();
    let run = second.find("<h3>Run</h3>").unwrap();
    let rest = second.find("<h3>Rest</h3>").unwrap();
    assert!(run < rest);
}

#[test]
fn test_resync_of_unchanged_data_is_a_noop() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&two_date_batch("5k easy pace"));

    ctx.sync();
    let first = ctx.render_bytes();
    ctx.sync();
    let second = ctx.render_bytes();

    assert_eq!(first, second);
}

#[test]
fn test_content_edit_only_bumps_its_own_entry() {
    let ctx = TestContext::new();
    let mut initial = ctx.mock_schedule(&two_date_batch("5k easy pace"));
    ctx.sync();
    let before = ctx.render();

    initial.delete();
    ctx.mock_schedule(&two_date_batch("10k tempo"));
    ctx.sync();
    let after = ctx.render();

    // 2025-01-05 untouched, 2025-01-12 bumped.
    assert_eq!(before.entries()[0].updated(), after.entries()[0].updated());
    assert_ne!(before.entries()[1].updated(), after.entries()[1].updated());
    assert!(after.entries()[1].updated() > before.entries()[1].updated());
    // First-seen time never moves.
    assert_eq!(before.entries()[1].published(), after.entries()[1].published());
}

#[test]
fn test_entry_ids_survive_store_rebuild() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&two_date_batch("5k easy pace"));

    ctx.sync();
    let before: Vec<String> = ctx
        .render()
        .entries()
        .iter()
        .map(|e| e.id().to_string())
        .collect();

    std::fs::remove_file(ctx.db_path()).unwrap();
    ctx.sync();
    let after: Vec<String> = ctx
        .render()
        .entries()
        .iter()
        .map(|e| e.id().to_string())
        .collect();

    assert_eq!(before, after);
}

#[test]
fn test_blank_lines_render_as_one_double_break() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&batch(&[day_group(
        "2025-01-05",
        &[workout("strength", "Deadlift", r"A\r\n\r\nB")],
    )]));

    ctx.sync();
    let feed = ctx.render();
    let content = feed.entries()[0].content().unwrap().value().unwrap().to_string();
    assert!(content.contains("A\n<br/><br/>\nB"));
}

#[test]
fn test_entry_without_results_url_links_to_site() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&batch(&[day_group(
        "2025-01-05",
        &[workout("strength", "Deadlift", "5x5")],
    )]));
    ctx.sync();

    let output = Command::cargo_bin("wodfeed")
        .unwrap()
        .args(["render", "--db"])
        .arg(ctx.db_path())
        .env("WODFEED_SITE_URL", "https://example.com/wod")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let feed = Feed::read_from(&output[..]).unwrap();

    let links = feed.entries()[0].links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].href(), "https://example.com/wod");
}

#[test]
fn test_malformed_group_is_skipped_but_sync_succeeds() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&batch(&[
        r#"{"entries": [{"wod_section": "s"}]}"#.to_string(),
        day_group("2025-01-05", &[workout("strength", "Deadlift", "5x5")]),
    ]));

    let output = ctx.run(&["sync"]).success().get_output().stderr.clone();
    let stderr = String::from_utf8(output).unwrap();
    assert!(stderr.contains("skipping day-group"), "got: {stderr}");
    assert_eq!(ctx.render().entries().len(), 1);
}

#[test]
fn test_failed_fetch_leaves_no_store_behind() {
    let ctx = TestContext::new();
    ctx.server.mock(|when, then| {
        when.method(GET).path("/wods");
        then.status(500);
    });

    ctx.run(&["sync"]).failure();
    assert!(!ctx.db_path().exists());
}

#[test]
fn test_sync_requires_token() {
    let ctx = TestContext::new();
    let db = ctx.db_path();
    let assert = Command::cargo_bin("wodfeed")
        .unwrap()
        .args(["sync", "--db"])
        .arg(&db)
        .env_remove("BTWB_TOKEN")
        .env("WODFEED_SOURCE_URL", ctx.server.url("/wods"))
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("BTWB_TOKEN"), "got: {stderr}");
}

#[test]
fn test_render_writes_to_output_file() {
    let ctx = TestContext::new();
    ctx.mock_schedule(&two_date_batch("5k easy pace"));
    ctx.sync();

    let out = ctx.dir.path().join("workouts.atom");
    ctx.run(&["render", "--output", out.to_str().unwrap()])
        .success();

    let feed = Feed::read_from(&std::fs::read(&out).unwrap()[..]).unwrap();
    assert_eq!(feed.entries().len(), 2);
}

#[test]
fn test_render_of_empty_store_yields_empty_feed() {
    let ctx = TestContext::new();
    let feed = ctx.render();
    assert!(feed.entries().is_empty());
}
