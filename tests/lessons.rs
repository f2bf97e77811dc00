mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, PASSWORD, json_body, seed_activity, seed_lesson, setup_server, setup_test_db,
    signup_action,
};

#[tokio::test]
async fn route_lessons_require_session_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    Flow::new()
        .step(Action::new("list_anonymous", "GET", "/api/v1/lessons/").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_catalogue_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    let a1_first = seed_lesson(&db, "A1", 1).await;
    seed_activity(&db, a1_first, 1).await;
    seed_activity(&db, a1_first, 0).await;
    seed_lesson(&db, "A1", 2).await;
    seed_lesson(&db, "B1", 1).await;

    Flow::new()
        .step(signup_action("learner", PASSWORD))
        .step(
            Action::new("list_all", "GET", "/api/v1/lessons/").assert_body(|body| {
                let lessons: Vec<Value> = json_body(body);
                assert_eq!(lessons.len(), 3);
                assert_eq!(lessons[0]["level"], "A1");
                assert_eq!(lessons[0]["lesson_number"], 1);
                assert_eq!(lessons[0]["activity_count"], 2);
                assert_eq!(lessons[0]["unlocked"], true);
                assert_eq!(lessons[0]["completed"], false);
                assert_eq!(lessons[1]["unlocked"], false);
                // every level starts open
                assert_eq!(lessons[2]["level"], "B1");
                assert_eq!(lessons[2]["unlocked"], true);
            }),
        )
        .step(
            Action::new("list_level", "GET", "/api/v1/lessons/")
                .with_param("level", "a1")
                .assert_body(|body| {
                    let lessons: Vec<Value> = json_body(body);
                    assert_eq!(lessons.len(), 2);
                    assert!(lessons.iter().all(|l| l["level"] == "A1"));
                }),
        )
        .step(
            Action::new("list_unknown_level", "GET", "/api/v1/lessons/")
                .with_param("level", "Z9")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("detail", "GET", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{a1_first}"))
                .assert_body(|body| {
                    let lesson: Value = json_body(body);
                    let activities = lesson["activities"].as_array().unwrap();
                    assert_eq!(activities.len(), 2);
                    assert_eq!(activities[0]["order_index"], 0);
                    assert_eq!(activities[1]["order_index"], 1);
                    assert_eq!(activities[0]["activity_type"], "flashcards");
                    assert!(activities[0]["result"].is_null());
                    assert!(lesson["progress"].is_null());
                }),
        )
        .step(
            Action::new("detail_unknown", "GET", "/api/v1/lessons/00000000-0000-0000-0000-000000000000")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lesson_progress_flow_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    let lesson = seed_lesson(&db, "A1", 1).await;
    let first = seed_activity(&db, lesson, 0).await;
    let second = seed_activity(&db, lesson, 1).await;
    let next_lesson = seed_lesson(&db, "A1", 2).await;
    let foreign = seed_activity(&db, next_lesson, 0).await;
    let empty_lesson = seed_lesson(&db, "B2", 1).await;

    let result_path = move |activity: uuid::Uuid| {
        move |_: &common::FlowContext| {
            format!("/api/v1/lessons/{lesson}/activities/{activity}/result")
        }
    };

    Flow::new()
        .step(signup_action("student", PASSWORD))
        .step(
            Action::new("complete_too_early", "POST", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}/complete"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("first_attempt", "POST", "")
                .with_dyn_path(result_path(first))
                .with_body(json!({"score": 8, "max_score": 10, "answers": {"cat": "gato"}}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["first_attempt"], true);
                    assert_eq!(res["xp_awarded"], 8);
                    assert_eq!(res["xp"], 8);
                    assert_eq!(res["streak"]["current"], 1);
                    assert_eq!(res["result"]["attempts"], 1);
                }),
        )
        .step(
            Action::new("worse_retry", "POST", "")
                .with_dyn_path(result_path(first))
                .with_body(json!({"score": 5, "max_score": 10}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["first_attempt"], false);
                    assert_eq!(res["xp_awarded"], 0);
                    assert_eq!(res["xp"], 8);
                    // best ratio is kept
                    assert_eq!(res["result"]["score"], 8);
                    assert_eq!(res["result"]["attempts"], 2);
                    assert_eq!(res["streak"]["current"], 1);
                }),
        )
        .step(
            Action::new("activity_of_other_lesson", "POST", "")
                .with_dyn_path(result_path(foreign))
                .with_body(json!({"score": 1, "max_score": 1}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("score_over_max", "POST", "")
                .with_dyn_path(result_path(second))
                .with_body(json!({"score": 11, "max_score": 10}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("complete_with_unfinished", "POST", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}/complete"))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("1 of 2 activities finished"))),
        )
        .step(
            Action::new("second_activity", "POST", "")
                .with_dyn_path(result_path(second))
                .with_body(json!({"score": 10, "max_score": 10}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["xp_awarded"], 10);
                    assert_eq!(res["xp"], 18);
                }),
        )
        .step(
            Action::new("complete", "POST", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}/complete"))
                .assert_body(move |body| {
                    let res: Value = json_body(body);
                    // 18 of 20 points
                    assert_eq!(res["percentage"], 90);
                    assert_eq!(res["stars"], 3);
                    assert_eq!(res["xp_awarded"], 50);
                    assert_eq!(res["xp"], 68);
                    assert_eq!(res["next_lesson_id"], next_lesson.to_string());
                }),
        )
        .step(
            Action::new("complete_again", "POST", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}/complete"))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["xp_awarded"], 0);
                    assert_eq!(res["best_stars"], 3);
                    assert_eq!(res["xp"], 68);
                }),
        )
        .step(
            Action::new("next_lesson_unlocked", "GET", "/api/v1/lessons/")
                .with_param("level", "A1")
                .assert_body(|body| {
                    let lessons: Vec<Value> = json_body(body);
                    assert_eq!(lessons[0]["completed"], true);
                    assert_eq!(lessons[0]["stars"], 3);
                    assert_eq!(lessons[1]["unlocked"], true);
                }),
        )
        .step(
            Action::new("detail_with_results", "GET", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}"))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["progress"]["score"], 90);
                    assert_eq!(res["progress"]["attempts"], 2);
                    assert_eq!(res["activities"][0]["result"]["score"], 8);
                    assert_eq!(res["activities"][1]["result"]["score"], 10);
                }),
        )
        .step(
            Action::new("complete_empty_lesson", "POST", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{empty_lesson}/complete"))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("no activities"))),
        )
        .step(
            Action::new("complete_unknown", "POST", "/api/v1/lessons/00000000-0000-0000-0000-000000000000/complete")
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("progress", "GET", "/api/v1/progress/").assert_body(|body| {
                let res: Value = json_body(body);
                assert_eq!(res["username"], "student");
                assert_eq!(res["xp"], 68);
                assert_eq!(res["xp_level"], 1);
                assert_eq!(res["xp_to_next_level"], 32);
                assert_eq!(res["current_streak"], 1);
                assert_eq!(res["longest_streak"], 1);
                assert_eq!(res["total_lessons"], 3);
                assert_eq!(res["completed_lessons"], 1);
                assert_eq!(res["total_stars"], 3);
                assert_eq!(res["completed_activities"], 2);
                assert!(res["cefr_level"].is_null());
                assert!(res["latest_evaluation"].is_null());
            }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_results_are_per_user_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    let lesson = seed_lesson(&db, "A2", 1).await;
    let activity = seed_activity(&db, lesson, 0).await;

    Flow::new()
        .step(signup_action("firstcat", PASSWORD))
        .step(
            Action::new("submit", "POST", "")
                .with_dyn_path(move |_| {
                    format!("/api/v1/lessons/{lesson}/activities/{activity}/result")
                })
                .with_body(json!({"score": 3, "max_score": 4})),
        )
        .step(signup_action("secondcat", PASSWORD).with_clear_cookies(true))
        .step(
            Action::new("other_user_detail", "GET", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}"))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert!(res["activities"][0]["result"].is_null());
                }),
        )
        .step(
            Action::new("other_user_first_attempt", "POST", "")
                .with_dyn_path(move |_| {
                    format!("/api/v1/lessons/{lesson}/activities/{activity}/result")
                })
                .with_body(json!({"score": 4, "max_score": 4}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["first_attempt"], true);
                    assert_eq!(res["xp_awarded"], 10);
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lesson_concurrent_completion_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    let lesson = seed_lesson(&db, "A1", 1).await;
    let activity = seed_activity(&db, lesson, 0).await;

    Flow::new()
        .step(signup_action("sprinter", PASSWORD))
        .step(
            Action::new("perfect_result", "POST", "")
                .with_dyn_path(move |_| {
                    format!("/api/v1/lessons/{lesson}/activities/{activity}/result")
                })
                .with_body(json!({"score": 10, "max_score": 10}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["xp"], 10);
                }),
        )
        .run(&mut server, &db)
        .await;

    let path = format!("/api/v1/lessons/{lesson}/complete");
    let (r1, r2, r3, r4, r5, r6) = tokio::join!(
        server.post(&path),
        server.post(&path),
        server.post(&path),
        server.post(&path),
        server.post(&path),
        server.post(&path),
    );

    let awarded: Vec<i64> = [r1, r2, r3, r4, r5, r6]
        .iter()
        .map(|resp| {
            resp.assert_status_ok();
            let res: Value = resp.json();
            assert_eq!(res["stars"], 3);
            res["xp_awarded"].as_i64().unwrap()
        })
        .collect();
    assert_eq!(awarded.iter().filter(|xp| **xp == 50).count(), 1);
    assert_eq!(awarded.iter().sum::<i64>(), 50);

    Flow::new()
        .step(
            Action::new("progress", "GET", "/api/v1/progress/").assert_body(|body| {
                let res: Value = json_body(body);
                assert_eq!(res["xp"], 60);
                assert_eq!(res["completed_lessons"], 1);
            }),
        )
        .step(
            Action::new("detail", "GET", "")
                .with_dyn_path(move |_| format!("/api/v1/lessons/{lesson}"))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["progress"]["attempts"], 6);
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lesson_result_score_bounds_test() {
    let db = setup_test_db().await;
    let mut server = setup_server(&db).await;

    let lesson = seed_lesson(&db, "A1", 1).await;
    let activity = seed_activity(&db, lesson, 0).await;
    let path = move |_: &common::FlowContext| {
        format!("/api/v1/lessons/{lesson}/activities/{activity}/result")
    };

    Flow::new()
        .step(signup_action("bounded", PASSWORD))
        .step(
            Action::new("huge_max", "POST", "")
                .with_dyn_path(path)
                .with_body(json!({"score": 2147483647, "max_score": 2147483647}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("largest_max", "POST", "")
                .with_dyn_path(path)
                .with_body(json!({"score": 5000, "max_score": 10000}))
                .assert_body(|body| {
                    let res: Value = json_body(body);
                    assert_eq!(res["xp_awarded"], 5);
                }),
        )
        .run(&mut server, &db)
        .await;
}
