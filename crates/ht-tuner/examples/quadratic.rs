use ht_tuner::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Hypertuner quadratic example");

    let plan = TuningPlan::from_json(
        r#"{
            "config": {"name": "quadratic", "epochs": 2, "reduction": "minimize"},
            "variables": [
                {"kind": "categorical", "name": "a", "values": [-1, 1]},
                {"kind": "interval", "name": "x", "start": -1, "stop": 1, "step": 0.05,
                 "required_neighbors": 2},
                {"kind": "interval", "name": "y", "start": -1, "stop": 1, "step": 0.05,
                 "required_neighbors": 2}
            ]
        }"#,
    )?;

    let mut tuner = Tuner::from_plan(&plan, |p: &Assignment| {
        let a = p.get_f64("a").unwrap_or(0.0);
        let x = p.get_f64("x").unwrap_or(0.0);
        let y = p.get_f64("y").unwrap_or(0.0);
        a + (0.1 - x).powi(2) + (y - 0.4).powi(4)
    })?;

    println!("Visiting variables in order: {:?}", tuner.schedule());

    let best = tuner.run()?;
    let status = tuner.status();

    println!("Best assignment: {}", best);
    println!(
        "Evaluations: {}, cache hits: {}, best score: {:?}",
        status.evaluations, status.cache_hits, status.best_score
    );
    println!("{}", serde_json::to_string_pretty(status)?);

    Ok(())
}
