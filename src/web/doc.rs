use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "TutorCat API"),
    paths(
        crate::web::routes::account::account_signup_handler,
        crate::web::routes::account::account_signin_handler,
        crate::web::routes::account::account_signout_handler,
        crate::web::routes::account::account_me_handler,
        crate::web::routes::account::account_verify_handler,
        crate::web::routes::account::account_update_handler,
        crate::web::routes::account::account_delete_handler,
        crate::web::routes::lessons::lessons_list_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_activity_result_handler,
        crate::web::routes::lessons::lessons_complete_handler,
        crate::web::routes::progress::progress_get_handler,
        crate::web::routes::evaluation::evaluation_test_handler,
        crate::web::routes::evaluation::evaluation_submit_handler,
        crate::web::routes::evaluation::evaluation_result_handler,
        crate::web::routes::admin::admin_users_list_handler,
        crate::web::routes::admin::admin_users_update_handler,
        crate::web::routes::admin::admin_users_delete_handler,
        crate::web::routes::admin::admin_lessons_list_handler,
        crate::web::routes::admin::admin_lessons_create_handler,
        crate::web::routes::admin::admin_lessons_update_handler,
        crate::web::routes::admin::admin_lessons_delete_handler,
        crate::web::routes::admin::admin_activities_create_handler,
        crate::web::routes::admin::admin_activities_update_handler,
        crate::web::routes::admin::admin_activities_delete_handler,
        crate::web::routes::admin::admin_evaluation_list_handler,
        crate::web::routes::admin::admin_evaluation_create_handler,
        crate::web::routes::admin::admin_evaluation_update_handler,
        crate::web::routes::admin::admin_evaluation_delete_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Registration and sessions"),
        (name = "lessons", description = "Lesson catalogue and learner results"),
        (name = "progress", description = "Dashboard summary"),
        (name = "evaluation", description = "Placement test"),
        (name = "admin", description = "Content and user management"),
    )
)]
pub struct ApiDoc;
