pub mod quiz_dto;
pub mod request;
pub mod response;

pub use quiz_dto::{questions_from_payload, RawQuestionDto};
pub use request::{GenerateQuizRequestDto, GradeQuizRequestDto};
pub use response::{GradeReport, MessageResponse, QuestionGrade, StatusResponse};
