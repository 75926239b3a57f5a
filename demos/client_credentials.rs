//! Demonstrates loading a token manager config from JSON, reusing the cached access token, and
//! recovering from a rejected token through `execute`.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use caspio_auth::{config::TokenManagerConfig, manager::ReqwestTokenManager, reqwest::Client};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body("grant_type=client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":900}");
		})
		.await;
	let records_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/rest/v2/tables/Orders/records");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"Result\":[{\"OrderId\":1,\"Status\":\"open\"}]}");
		})
		.await;
	let config: TokenManagerConfig = serde_json::from_value(serde_json::json!({
		"token_endpoint": server.url("/oauth/token"),
		"client_id": "demo-client",
		"client_secret": "super-secret",
		"safety_buffer_secs": 60,
	}))?;
	let manager = ReqwestTokenManager::new(config);
	let first = manager.get_token().await?;
	let second = manager.get_token().await?;

	println!("Cached token fingerprint: {}.", first.fingerprint());
	println!("Second lookup reused the cache: {}.", first == second);

	let client = Client::new();
	let request = client.get(server.url("/rest/v2/tables/Orders/records")).build()?;
	let response = manager.execute(&client, &request).await?;

	println!("Records response: {}.", response.text().await?);

	token_mock.assert_calls_async(1).await;
	records_mock.assert_async().await;

	Ok(())
}
