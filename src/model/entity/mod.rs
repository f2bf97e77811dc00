mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonScoreRow, LessonWithProgressRow};

mod lesson_activity;
pub use lesson_activity::{LessonActivity, LessonActivityCreate};

mod activity_result;
pub use activity_result::{LessonActivityResult, LessonActivityResultCreate};

mod user_progress;
pub use user_progress::{LessonCompletion, UserProgress, UserProgressCreate};

pub use evaluation_test::{EvaluationTest, EvaluationTestCreate};

mod evaluation_result;
pub use evaluation_result::{EvaluationResult, EvaluationResultCreate};
