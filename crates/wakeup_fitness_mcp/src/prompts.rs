use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn weekly_review_prompt(days: u32) -> GetPromptResult {
    GetPromptResult::new(vec![PromptMessage::new_text(
        PromptMessageRole::User,
        format!(
            "Review my sleep and activity over the past {days} days.\n\nFirst call check_fitness_access. If there is no session, say so and stop.\n\nThen call get_activity_summary with days={days} and report:\n1. Total steps and average daily steps\n2. Total sleep hours and average nightly sleep\n3. How the averages compare with common guidance (7-9 hours of sleep, 7,000-10,000 steps)\n\nIf a figure is unavailable, report it as unavailable rather than guessing. Keep the summary short and factual."
        ),
    )])
    .with_description(format!("Sleep and activity review over the past {days} days"))
}
