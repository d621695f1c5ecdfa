#![allow(dead_code)]

use reqwest::Client;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use session_service::config::SessionServiceConfig;
use session_service::services::providers::mock::MockTextProvider;
use session_service::services::InMemorySessionStore;
use session_service::startup::Application;
use std::sync::Arc;

pub const TEST_USER_ID: &str = "test_user_123";

pub const ANXIOUS_TRANSCRIPT: &str = "User: I feel anxious\nAssistant: Let's breathe together";

pub const NEGATIVE_ANALYSIS: &str = r#"{
  "overallMood": "negative",
  "moodScore": 3,
  "stressTriggers": ["exams", "deadlines"],
  "suggestions": ["Try box breathing", "Take short breaks", "Talk to someone you trust"],
  "keyTopics": ["anxiety", "school"],
  "aiGeneratedSummary": "The user feels anxious about upcoming exams."
}"#;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub provider: Arc<MockTextProvider>,
    pub store: Arc<InMemorySessionStore>,
}

impl TestApp {
    /// Spawn with the default canned analysis.
    pub async fn spawn() -> Self {
        Self::spawn_with(MockTextProvider::new()).await
    }

    pub async fn spawn_with(provider: MockTextProvider) -> Self {
        let config = SessionServiceConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            ..SessionServiceConfig::default()
        };

        let provider = Arc::new(provider);
        let store = Arc::new(InMemorySessionStore::new());

        let app = Application::build_with(config, provider.clone(), store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            provider,
            store,
        }
    }

    pub async fn save_session(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/session/save", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn save_transcript(&self, text: &str, user_id: &str) -> Value {
        let response = self
            .save_session(&json!({ "conversationText": text, "userId": user_id }))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid JSON response")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
