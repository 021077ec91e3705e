//! Message pools for generated notifications.

use rand::Rng;

/// Pick a reminder message for a scheduled workout.
pub fn workout_reminder(routine_name: &str) -> String {
    let pool = [
        format!("Time for your {routine_name} workout! Let's crush it!"),
        format!("Your {routine_name} session is scheduled for today. Ready to get stronger?"),
        format!("Don't forget your {routine_name} workout today. You've got this!"),
        format!("{routine_name} day! Time to push your limits."),
        format!("Remember to complete your {routine_name} workout today for consistent progress."),
    ];
    pick(&pool)
}

/// Pick a rest-day message.
pub fn rest_day() -> String {
    let pool = [
        "It's a rest day! Take time to recover and prepare for your next workout.".to_string(),
        "Rest day scheduled. Remember, recovery is when your muscles grow stronger!".to_string(),
        "No workout today - enjoy your rest day and focus on mobility and nutrition.".to_string(),
        "Rest days are part of training! Give your body time to recover.".to_string(),
        "Today's focus: recovery. Make sure to get enough sleep and stay hydrated.".to_string(),
    ];
    pick(&pool)
}

fn pick(pool: &[String]) -> String {
    let idx = rand::thread_rng().gen_range(0..pool.len());
    pool[idx].clone()
}
