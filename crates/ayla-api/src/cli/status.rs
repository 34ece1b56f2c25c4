//! System status dashboard command.

use anyhow::Result;
use console::style;
use sqlx::Row;

use crate::state::AppState;

/// Display system status dashboard.
///
/// Shows conversation/message counts, analytics coverage, the configured
/// model, and the data directory.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    // Gather stats with COUNT(*) queries on the reader pool.
    let conversation_row = sqlx::query(
        r#"SELECT
            COUNT(*) as total_conversations,
            SUM(CASE WHEN active = 1 THEN 1 ELSE 0 END) as active_conversations
        FROM conversations"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await?;

    let total_conversations: i64 = conversation_row.try_get("total_conversations").unwrap_or(0);
    let active_conversations: i64 = conversation_row.try_get("active_conversations").unwrap_or(0);

    let message_row = sqlx::query(
        r#"SELECT
            COUNT(*) as total_messages,
            COALESCE(SUM(tokens_used), 0) as total_tokens
        FROM messages"#,
    )
    .fetch_one(&state.db_pool.reader)
    .await?;

    let total_messages: i64 = message_row.try_get("total_messages").unwrap_or(0);
    let total_tokens: i64 = message_row.try_get("total_tokens").unwrap_or(0);

    let analytics_row =
        sqlx::query("SELECT COUNT(*) as tracked FROM conversation_analytics")
            .fetch_one(&state.db_pool.reader)
            .await?;
    let tracked_conversations: i64 = analytics_row.try_get("tracked").unwrap_or(0);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "model": state.session_manager.model_name(),
            "conversations": {
                "total": total_conversations,
                "active": active_conversations,
                "with_analytics": tracked_conversations,
            },
            "messages": total_messages,
            "tokens_used": total_tokens,
            "rate_limit_per_hour": state.config.hourly_limit,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Ayla v{}",
        style("⚕").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Conversations ──").dim());
    println!("  Total:   {}", style(total_conversations).bold());
    println!("  Active:  {}", style(active_conversations).green());
    if tracked_conversations > 0 {
        println!("  Tracked: {tracked_conversations}");
    }
    println!();

    println!("  {}", style("── Usage ──").dim());
    println!("  Messages:    {total_messages}");
    println!("  Tokens used: {}", format_tokens(total_tokens));
    println!(
        "  Rate limit:  {}/hour",
        state.config.hourly_limit
    );
    println!();

    println!("  {}", style("── Backend ──").dim());
    println!("  Model:    {}", state.session_manager.model_name());
    println!("  Data dir: {}", state.data_dir.display());
    println!();

    Ok(())
}

/// Humanize a token count (e.g. 12500 -> "12.5k").
fn format_tokens(tokens: i64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}
