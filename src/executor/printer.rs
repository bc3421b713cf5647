use colored::{Color, Colorize};

use super::models::{ExecutionResult, ExecutionSuccess, ResponseData};

pub fn print_execution_result(method: &str, url: &str, result: &ExecutionResult) {
    println!("{} {}", method.to_ascii_uppercase().bold(), url.cyan());

    match result {
        ExecutionResult::Success(success) => print_success(success),
        ExecutionResult::Failure { error } => {
            println!("{} {}", "Error:".bold(), error.red());
        }
    }
}

fn print_success(success: &ExecutionSuccess) {
    println!(
        "{} {} {}",
        "Status:".bold(),
        success.status.to_string().color(status_color(success.status)),
        format!("({:.1} ms)", success.duration * 1000.0).dimmed()
    );

    println!("{}", "Response headers".bold());
    for (name, value) in &success.headers {
        println!("  {}: {}", name.cyan(), value.dimmed());
    }

    println!("{}", "Body".bold());
    println!("{}", render_data(&success.data));
}

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn render_data(data: &ResponseData) -> String {
    match data {
        ResponseData::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        ResponseData::Text(text) => text.clone(),
    }
}
