// tests/api_tests.rs

use campus_quiz::{config::Config, routes, state::AppState, store::LocalStore};
use std::sync::Arc;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Tests run against the local file store in a unique temp file, so no
/// database is required.
async fn spawn_app() -> String {
    let data_file = std::env::temp_dir()
        .join(format!("campus-quiz-test-{}.json", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let config = Config {
        database_url: None,
        data_file: data_file.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        faculty_code: "TEST_FACULTY".to_string(),
        admin_username: None,
        admin_password: None,
        ai_api_key: None,
        ai_base_url: "https://generativelanguage.googleapis.com"
            .parse()
            .unwrap(),
        ai_model: "gemini-2.0-flash".to_string(),
        ai_enabled: true,
    };

    let store = Arc::new(
        LocalStore::open(&data_file)
            .await
            .expect("Failed to open temp data file"),
    );

    let state = AppState::new(store, config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a student and returns (token, user_id).
async fn register_student(client: &reqwest::Client, address: &str) -> (String, String) {
    let unique = &uuid::Uuid::new_v4().to_string()[..8];
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": format!("stu_{unique}"),
            "name": "Test Student",
            "email": format!("stu_{unique}@campus.test"),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed")
        .json()
        .await
        .expect("Failed to parse register json");

    (
        body["token"].as_str().expect("Token missing").to_string(),
        body["user"]["id"].as_str().expect("Id missing").to_string(),
    )
}

/// Registers a faculty member with the verification code, returns a token.
async fn register_admin(client: &reqwest::Client, address: &str) -> String {
    let unique = &uuid::Uuid::new_v4().to_string()[..8];
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": format!("fac_{unique}"),
            "name": "Test Faculty",
            "email": format!("fac_{unique}@campus.test"),
            "password": "password123",
            "role": "ADMIN",
            "faculty_code": "TEST_FACULTY"
        }))
        .send()
        .await
        .expect("Register failed")
        .json()
        .await
        .expect("Failed to parse register json");

    body["token"].as_str().expect("Token missing").to_string()
}

/// Creates a two-question quiz (correct answers [1, 0]) and returns its id.
async fn create_sample_quiz(client: &reqwest::Client, address: &str, admin_token: &str) -> String {
    let response = client
        .post(format!("{}/api/admin/quizzes", address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&serde_json::json!({
            "title": "Data Structures V.1",
            "description": "Arrays, lists and stacks.",
            "category": "Computer Science",
            "duration_minutes": 10,
            "questions": [
                {
                    "text": "Which data structure follows the LIFO principle?",
                    "options": ["Queue", "Stack", "Tree", "Graph"],
                    "correct_answer": 1
                },
                {
                    "text": "Average-case lookup complexity of a hash map?",
                    "options": ["O(1)", "O(n)", "O(log n)", "O(n^2)"],
                    "correct_answer": 0
                }
            ]
        }))
        .send()
        .await
        .expect("Create quiz failed");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().expect("Quiz id missing").to_string()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let unique = &uuid::Uuid::new_v4().to_string()[..8];

    // Act
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": format!("u_{unique}"),
            "name": "New User",
            "email": format!("u_{unique}@campus.test"),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap_or("").is_empty());
    assert_eq!(body["user"]["role"], "STUDENT");
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a username that is too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "name": "Shorty",
            "email": "shorty@campus.test",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let unique = &uuid::Uuid::new_v4().to_string()[..8];
    let payload = serde_json::json!({
        "username": format!("dup_{unique}"),
        "name": "First",
        "email": format!("dup_{unique}@campus.test"),
        "password": "password123"
    });

    // Act
    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn faculty_registration_requires_verification_code() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let unique = &uuid::Uuid::new_v4().to_string()[..8];

    // Act: no code
    let denied = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": format!("prof_{unique}"),
            "name": "Prof",
            "email": format!("prof_{unique}@campus.test"),
            "password": "password123",
            "role": "ADMIN"
        }))
        .send()
        .await
        .unwrap();

    // Act: correct code
    let allowed = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": format!("prof2_{unique}"),
            "name": "Prof",
            "email": format!("prof2_{unique}@campus.test"),
            "password": "password123",
            "role": "ADMIN",
            "faculty_code": "TEST_FACULTY"
        }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(denied.status().as_u16(), 401);
    assert_eq!(allowed.status().as_u16(), 201);
    let body: serde_json::Value = allowed.json().await.unwrap();
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn login_accepts_username_or_email() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let unique = &uuid::Uuid::new_v4().to_string()[..8];
    let username = format!("login_{unique}");
    let email = format!("login_{unique}@campus.test");

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "name": "Login User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    // Act + Assert: by username
    let by_username = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "identifier": username, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(by_username.status().as_u16(), 200);

    // Act + Assert: by email
    let by_email = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "identifier": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(by_email.status().as_u16(), 200);

    // Act + Assert: wrong password
    let wrong = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "identifier": username, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_are_forbidden_for_students() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (student_token, _) = register_student(&client, &address).await;

    // Act
    let response = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn students_never_see_answer_keys() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = register_admin(&client, &address).await;
    let quiz_id = create_sample_quiz(&client, &address, &admin_token).await;
    let (student_token, _) = register_student(&client, &address).await;

    // Act: catalog
    let catalog_body = client
        .get(format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Act: single quiz
    let quiz_body = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Assert: no answer key anywhere in the student payloads
    assert!(!catalog_body.contains("correct_answer"));
    assert!(!quiz_body.contains("correct_answer"));

    let catalog: serde_json::Value = serde_json::from_str(&catalog_body).unwrap();
    assert_eq!(catalog[0]["question_count"], 2);

    // Faculty still get the full document for the console
    let admin_body = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(admin_body.contains("correct_answer"));
}

#[tokio::test]
async fn full_play_through_persists_the_attempt() {
    // Arrange: quiz with correct answers [1, 0]; student will answer [1, 2]
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = register_admin(&client, &address).await;
    let quiz_id = create_sample_quiz(&client, &address, &admin_token).await;
    let (student_token, student_id) = register_student(&client, &address).await;
    let auth = format!("Bearer {}", student_token);

    // Act: start a play session
    let start = client
        .post(format!("{}/api/quizzes/{}/play", address, quiz_id))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(start.status().as_u16(), 201);
    let view: serde_json::Value = start.json().await.unwrap();
    let token = view["token"].as_str().unwrap().to_string();

    assert_eq!(view["phase"], "in_progress");
    assert_eq!(view["question_number"], 1);
    assert_eq!(view["total_questions"], 2);
    assert_eq!(view["remaining_seconds"], 600);
    assert_eq!(view["progress_percent"], 50);

    // Act: answer question 1 correctly (option 1)
    let view: serde_json::Value = client
        .post(format!("{}/api/play/{}/answer", address, token))
        .header("Authorization", &auth)
        .json(&serde_json::json!({ "option": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "answer_shown");
    assert_eq!(view["feedback"]["correct"], true);
    assert_eq!(view["question"]["option_states"][1], "correct");

    // Act: advance, then answer question 2 wrong (option 2, correct is 0)
    client
        .post(format!("{}/api/play/{}/next", address, token))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();

    let view: serde_json::Value = client
        .post(format!("{}/api/play/{}/answer", address, token))
        .header("Authorization", &auth)
        .json(&serde_json::json!({ "option": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["feedback"]["correct"], false);
    assert_eq!(view["feedback"]["correct_answer"], 0);

    // Act: submit
    let view: serde_json::Value = client
        .post(format!("{}/api/play/{}/submit", address, token))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "submitted");
    assert_eq!(view["attempt"]["score"], 1);
    assert_eq!(view["attempt"]["total_questions"], 2);
    assert_eq!(
        view["attempt"]["answers"],
        serde_json::json!([1, 2])
    );

    // Assert: the session is gone once its attempt is stored
    let stale = client
        .post(format!("{}/api/play/{}/submit", address, token))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status().as_u16(), 404);

    // Assert: the attempt shows up in the student's history
    let attempts: serde_json::Value = client
        .get(format!("{}/api/attempts", address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempts.as_array().unwrap().len(), 1);
    assert_eq!(attempts[0]["score"], 1);
    assert_eq!(attempts[0]["student_id"], student_id);

    // Assert: stats reflect the play-through (1/2 = 50%)
    let stats: serde_json::Value = client
        .get(format!("{}/api/stats", address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["per_quiz"][0]["best_percent"], 50);
    assert_eq!(stats["aggregate_percent"], 50);
}

#[tokio::test]
async fn attempts_are_scoped_to_the_student() {
    // Arrange: one student plays, another just looks
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin_token = register_admin(&client, &address).await;
    let quiz_id = create_sample_quiz(&client, &address, &admin_token).await;
    let (player_token, _) = register_student(&client, &address).await;
    let (bystander_token, _) = register_student(&client, &address).await;

    let view: serde_json::Value = client
        .post(format!("{}/api/quizzes/{}/play", address, quiz_id))
        .header("Authorization", format!("Bearer {}", player_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = view["token"].as_str().unwrap();

    for (option, action) in [(1, "answer"), (0, "next"), (0, "answer"), (0, "submit")] {
        let mut request =
            client.post(format!("{}/api/play/{}/{}", address, token, action));
        if action == "answer" {
            request = request.json(&serde_json::json!({ "option": option }));
        }
        request
            .header("Authorization", format!("Bearer {}", player_token))
            .send()
            .await
            .unwrap();
    }

    // Act + Assert: the bystander sees no attempts
    let bystander_attempts: serde_json::Value = client
        .get(format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", bystander_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bystander_attempts.as_array().unwrap().len(), 0);

    // Act + Assert: faculty see everything
    let all_attempts: serde_json::Value = client
        .get(format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all_attempts.as_array().unwrap().len(), 1);
}
