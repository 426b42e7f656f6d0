use crate::config::Config;
use crate::db::Store;

pub async fn cmd_task_status(config: &Config, limit: usize) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let tasks = store.list_tasks().await?;

    if tasks.is_empty() {
        println!("No tasks recorded.");
        return Ok(());
    }

    println!("{:-<90}", "");
    println!("{:<36} {:<24} {:<10} {:>8}  {}", "task_id", "title", "status", "progress", "queue");
    println!("{:-<90}", "");

    for task in tasks.into_iter().take(limit) {
        let title = if task.title.chars().count() > 24 { format!("{}…", task.title.chars().take(23).collect::<String>()) } else { task.title.clone() };
        println!("{:<36} {:<24} {:<10} {:>7}%  {}", task.task_id, title, task.status, task.progress, task.queue_type);
    }

    Ok(())
}
