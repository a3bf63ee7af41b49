use std::process::exit;
use std::time::Duration;

use json_fetch::{ClientOptions, FetchError, Fetcher, MainQueue, ReqwestClient};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
    name: String,
    email: Option<String>,
}

#[tokio::main]
async fn main() -> json_fetch::Result<()> {
    env_logger::init();

    // Expect the URL to be passed as the first argument
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <url>", args[0]);
        exit(1);
    }

    let transport =
        ReqwestClient::with_options(ClientOptions::default().with_timeout(Duration::from_secs(10)))?;
    let fetcher = Fetcher::with_transport(transport);

    // Plain async call
    match fetcher.fetch::<User>(&args[1]).await {
        Ok(user) => println!("User {}: {} ({:?})", user.id, user.name, user.email),
        Err(FetchError::UnsuccessfulStatus(status)) => eprintln!("Server answered {}", status),
        Err(err) => eprintln!("Fetch failed: {}", err),
    }

    // Callback delivered on this task through a queue
    let (handle, mut queue) = MainQueue::new();
    fetcher
        .fetch_with(&args[1], &handle, |outcome: json_fetch::Result<User>| match outcome {
            Ok(user) => println!("Delivered user {}", user.name),
            Err(err) => println!("Delivered error: {}", err),
        })
        .await;
    println!("Ran {} queued completion(s)", queue.drain());

    Ok(())
}
