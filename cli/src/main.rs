use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tutorcat::error::{AppError, AppResult};
use tutorcat::learning::evaluation::validate_questions;
use tutorcat::model::entity::{
    EvaluationTest, EvaluationTestCreate, Lesson, LessonActivityCreate, LessonCreate, UserEntity,
    UserEntityCreateUpdate,
};
use tutorcat::model::{CrudRepository, DbConnection, ModelManager};
use tutorcat::web::dto::admin::{ActivityBody, LessonBody};
use tutorcat::web::{AuthenticatedUser, UserRole, WebError, validate};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for managing TutorCat users and content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage placement tests
    Evaluation {
        #[command(subcommand)]
        action: EvaluationCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Create the user with the admin role
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
    /// Give an existing user the admin role
    Promote {
        #[arg(long)]
        username: String,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    /// Import a lesson with its activities from a JSON file
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

/// Placement test management
#[derive(Subcommand, Debug)]
pub enum EvaluationCommands {
    /// Import a test from a JSON file and make it the active one
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

/// Same fields as the admin lesson body, plus its activities.
#[derive(Debug, Deserialize)]
struct LessonFile {
    #[serde(flatten)]
    lesson: LessonBody,
    #[serde(default)]
    activities: Vec<ActivityBody>,
}

fn invalid(e: WebError) -> AppError {
    AppError::InvalidInput(e.client_display())
}

/// Checks the whole file before anything is written.
fn lesson_from_file(data: LessonFile) -> AppResult<(LessonCreate, Vec<LessonActivityCreate>)> {
    let lesson = LessonCreate::try_from(data.lesson).map_err(invalid)?;
    let activities = data
        .activities
        .into_iter()
        .map(|a| {
            let activity_type = a.validate().map_err(invalid)?;
            Ok(LessonActivityCreate {
                // replaced once the lesson exists
                lesson_id: Uuid::nil(),
                activity_type,
                title: a.title.trim().to_string(),
                content: a.content,
                order_index: a.order_index,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok((lesson, activities))
}

fn read_json<T: serde::de::DeserializeOwned>(file: &PathBuf) -> AppResult<T> {
    let raw = std::fs::read(file)?;
    Ok(serde_json::from_slice(&raw)?)
}

async fn find_user(mm: &ModelManager, actor: &AuthenticatedUser, username: &str) -> AppResult<UserEntity> {
    UserEntity::find_by_username(mm, actor, username)
        .await?
        .ok_or_else(|| AppError::InvalidInput(format!("user `{username}` not found")))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::InvalidInput("DATABASE_URL is not set".into()))?;
    let db_con = DbConnection::connect(&database_url)?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                email,
                password,
                admin,
            } => {
                validate::username(&username).map_err(invalid)?;
                validate::email(&email).map_err(invalid)?;
                validate::password(&password).map_err(invalid)?;

                let mut user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        email,
                        password_hash: tutorcat::auth::hash_password(&password)?,
                    },
                )
                .await?;
                if admin {
                    user = user.set_role(&mm, &actor, UserRole::Admin).await?;
                }
                println!("User created: {} ({}, {})", user.username(), user.id(), user.role());
            }

            UserCommands::Promote { username } => {
                let user = find_user(&mm, &actor, &username).await?;
                let user = user.set_role(&mm, &actor, UserRole::Admin).await?;
                println!("User promoted: {} ({})", user.username(), user.id());
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Import { file } => {
                let data: LessonFile = read_json(&file)?;
                let (lesson, activities) = lesson_from_file(data)?;
                let (lesson, activities) =
                    Lesson::create_with_activities(&mm, &actor, lesson, activities).await?;

                println!("Lesson created: {} ({})", lesson.title(), lesson.id());
                for activity in activities {
                    println!(
                        "  activity #{} {}: {}",
                        activity.order_index(),
                        activity.activity_type(),
                        activity.title()
                    );
                }
            }
        },

        Commands::Evaluation { action } => match action {
            EvaluationCommands::Import { file } => {
                let data: EvaluationTestCreate = read_json(&file)?;
                validate_questions(&data.questions)
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;

                let test = EvaluationTest::create_active(&mm, &actor, data).await?;
                println!("Evaluation test activated: {} ({})", test.title(), test.id());
            }
        },
    }

    Ok(())
}
