pub const OCR: &str = include_str!("../data/prompts/ocr.txt");
pub const QUESTIONS_TRUE_FALSE: &str = include_str!("../data/prompts/questions_true_false.txt");
pub const QUESTIONS_SINGLE_CHOICE: &str =
    include_str!("../data/prompts/questions_single_choice.txt");
pub const QUESTIONS_FLASH_CARD: &str = include_str!("../data/prompts/questions_flash_card.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result.trim().to_string()
}
