use questline::client::QuestlineClient;
use questline::config::load_config;
use questline::utils::logging;

#[tokio::main]
async fn main() {
    logging::init("info");

    let settings = load_config().expect("Failed to load configuration");
    let client = QuestlineClient::connect(settings)
        .await
        .expect("Failed to authenticate");

    // Print every challenge update pushed for the configured user until ctrl-c.
    let handle = client.start_challenge_notifications(|payload| {
        println!("challenge update: {payload}");
    });

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl-c");

    client.stop_challenge_notifications(&handle);
    client.shutdown().await;
}
