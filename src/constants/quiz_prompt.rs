pub const RESPONSE_RULES: &str = "Return ONLY one raw JSON object. No markdown, no code fences, no commentary before or after the object.
The JSON must be directly parseable: double quotes only, no trailing commas, no comments.
Write every question and every option in Vietnamese.
Write math and chemistry notation in plain text or simple LaTeX (x^2, \\frac{a}{b}, H2O); never wrap it in $ signs.";

pub const MCQ_SCHEMA: &str = r#"{
  "questions": [
    {
      "type": "mcq",
      "question": "...",
      "options": ["A. ...", "B. ...", "C. ...", "D. ..."],
      "answer": "A"
    }
  ]
}"#;

pub const TRUE_FALSE_SCHEMA: &str = r#"{
  "questions": [
    {
      "type": "truefalse",
      "question": "...",
      "options": ["A. Đúng", "B. Sai"],
      "answer": "A"
    }
  ]
}"#;

pub const MIXED_SCHEMA: &str = r#"{
  "questions": [
    {
      "type": "mcq",
      "question": "...",
      "options": ["A. ...", "B. ...", "C. ...", "D. ..."],
      "answer": "A"
    },
    {
      "type": "truefalse",
      "question": "...",
      "options": ["A. Đúng", "B. Sai"],
      "answer": "B"
    }
  ]
}"#;

/// Recall / comprehension / application shares, in percent.
pub const MCQ_DIFFICULTY_SPLIT: [u32; 3] = [40, 30, 30];
pub const TRUE_FALSE_DIFFICULTY_SPLIT: [u32; 3] = [50, 25, 25];
