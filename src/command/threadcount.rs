pub fn determine_thread_counts_1(
    total: Option<usize>,
) -> anyhow::Result<usize> {
    if let Some(total) = total {
        if total < 1 {
            anyhow::bail!("Number of threads must be at least 1")
        }
        anyhow::Ok(total)
    } else {
        let total = std::thread::available_parallelism();
        if let Ok(total) = total {
            anyhow::Ok(total.get())
        } else {
            log::warn!("Could not autodetect the number of threads available. Setting to 1, but it is better if you specify");
            anyhow::Ok(1)
        }
    }
}

/// Thread pool for per-cluster work
pub fn build_thread_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;
    Ok(pool)
}
