use std::sync::Arc;

use clap::Parser;
use livefeed::{
    client::{
        ensure_connected, feed::Feed, ClientConfig, ClientResult, HttpPostService, PostState,
        PostView,
    },
    structs::post::{PostId, UserId},
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{info, warn};

/// Follows the feed as one user and logs every like and comment change
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Base URL of the livefeed server
    #[arg(long, env = "LIVEFEED_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Id of the user acting in this session
    #[arg(long)]
    user: i64,
    /// Toggle the like on these posts once connected
    #[arg(long = "like", value_name = "POST")]
    likes: Vec<i64>,
    /// Post to comment on, with --text
    #[arg(long, value_name = "POST", requires = "text")]
    comment: Option<i64>,
    #[arg(long)]
    text: Option<String>,
}

#[tokio::main]
async fn main() -> ClientResult<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // The URL comes from the flag, which already falls back to the env
    let config = ClientConfig::new(&cli.server_url)?.with_env_settings()?;

    let service = Arc::new(HttpPostService::new(&config, UserId(cli.user))?);
    let channel = ensure_connected(&config).await?;

    let mut feed = Feed::new(channel.clone(), service.clone());
    feed.render(service.posts().await?);
    info!("Following {} post(s) as user {}", feed.len(), cli.user);

    let (sender, mut changes) = mpsc::unbounded_channel();
    for view in feed.views() {
        forward_changes(view, sender.clone());
    }
    drop(sender);

    for post_id in cli.likes {
        match feed.view(PostId(post_id)) {
            Some(view) => info!("Like on post {post_id} : {:?}", view.toggle_like().await),
            None => warn!("Post {post_id} is not in the feed"),
        }
    }

    if let (Some(post_id), Some(text)) = (cli.comment, cli.text) {
        match feed.view(PostId(post_id)) {
            Some(view) => {
                view.update(|state| state.set_comment_input(text));
                info!("Comment on post {post_id} : {:?}", view.submit_comment().await);
            }
            None => warn!("Post {post_id} is not in the feed"),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            state = changes.recv() => match state {
                Some(state) => log_state(&state),
                None => break,
            },
        }
    }

    channel.shutdown();
    info!("Bye");
    Ok(())
}

/// Feeds every reconciled state of `view` into `sender`
fn forward_changes(view: &PostView, sender: mpsc::UnboundedSender<PostState>) {
    let mut changes = view.changes();
    let post_id = view.post_id();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(state) => {
                    if sender.send(state).is_err() {
                        return;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {missed} change(s) of post {post_id}")
                }
                Err(RecvError::Closed) => return,
            }
        }
    });
}

fn log_state(state: &PostState) {
    info!(
        "Post {} by {} : {} like(s){}, {} comment(s)",
        state.post_id(),
        state.author().display_name(),
        state.like_count(),
        if state.is_liked() { " (liked)" } else { "" },
        state.comment_count()
    );
}
