pub mod exercise;
pub mod language;
pub mod result;
pub mod submission;

pub use exercise::{Exercise, ExerciseTranslation, LoginRequest};
pub use result::{CheckerResult, CheckerType, ExecuteResult, InboundFrame};
pub use submission::{
    ExerciseType, FileEntry, QuizAnswers, SaveSubmissionRequest, Submission, SubmissionEnvelope,
    UserExercise,
};
