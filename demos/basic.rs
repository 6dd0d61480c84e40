//! Basic example demonstrating the Taiga API client.
//!
//! Run with:
//! ```
//! TAIGA_HOST=https://api.taiga.io TAIGA_USER=me TAIGA_PASSWORD=secret cargo run --example basic
//! ```

use std::env;

use taigapi::{List, Query, TaigaClient};

#[tokio::main]
async fn main() -> taigapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    println!("Creating Taiga client...");
    let client = TaigaClient::from_env()?;
    println!("Connected to: {}", client.host());

    if !client.is_authenticated() {
        let username = env::var("TAIGA_USER").unwrap_or_default();
        let password = env::var("TAIGA_PASSWORD").unwrap_or_default();
        client.auth(&username, &password).await?;
    }

    let me = client.me().await?;
    println!("Logged in as {me}");

    // Projects the current user belongs to
    println!("\n--- Listing Projects ---");
    let member = me.id().unwrap_or_default();
    let projects = client
        .projects()
        .list(Query::new().with("member", member))
        .await?;
    println!("Found {} projects", projects.len());

    for project in &projects {
        println!("  - {} ({:?})", project, project.id());
    }

    if let Some(project) = projects.first() {
        println!("\n--- User Stories of {project} ---");
        let stories = project.list_user_stories().await?;
        let open = stories.filter([("is_closed", false)]);
        println!("{} stories, {} open", stories.len(), open.len());

        for story in open.iter().take(5) {
            println!("  #{} {}", story.get_i64("ref").unwrap_or_default(), story);
        }

        if let Some(project_id) = project.id() {
            println!("\n--- Searching for \"bug\" ---");
            let result = client.search(project_id, "bug").await?;
            println!(
                "{} matches: {} issues, {} tasks, {} stories",
                result.count,
                result.issues.len(),
                result.tasks.len(),
                result.user_stories.len()
            );
        }
    }

    Ok(())
}
