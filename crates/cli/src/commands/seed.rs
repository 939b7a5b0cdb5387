use std::fs;
use std::path::Path;

use loadline_core::domain::load::Load;
use loadline_db::{parse_loads, seed_loads, DemoLoadDataset, SeedResult};
use serde_json::json;

use crate::commands::{migrated_pool, prepare, CommandResult, StepError};

/// Seeds the load board from `loads_file`, or the built-in demo loads when
/// no file is given. Loads are upserted by id, so re-running is safe.
pub fn run(loads_file: Option<&Path>) -> CommandResult {
    let loads = match loads_file.map(read_loads).transpose() {
        Ok(loads) => loads,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("seed", error_class, message, exit_code);
        }
    };

    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;

        let seeded = match &loads {
            Some(loads) => seed_loads(&pool, loads).await,
            None => DemoLoadDataset::load(&pool).await,
        }
        .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        let verified = match (&seeded, &loads) {
            (Ok(_), None) => DemoLoadDataset::verify(&pool)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8)),
            _ => Ok(true),
        };

        pool.close().await;
        if !verified? {
            return Err(("seed_verification", "demo loads missing after seeding".to_string(), 6u8));
        }
        seeded
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            summary(&seeded, loads_file),
            Some(json!({
                "loads_seeded": seeded.loads_seeded,
                "total_loads": seeded.total_loads,
            })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn read_loads(path: &Path) -> Result<Vec<Load>, StepError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("loads_file", format!("failed to read {}: {error}", path.display()), 7u8)
    })?;
    parse_loads(&raw).map_err(|error| ("loads_file", error.to_string(), 7u8))
}

fn summary(seeded: &SeedResult, loads_file: Option<&Path>) -> String {
    let source = loads_file
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in demo loads".to_string());
    format!(
        "seeded {} loads from {source}; load board now holds {}",
        seeded.loads_seeded, seeded.total_loads
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use loadline_db::SeedResult;

    use super::summary;

    #[test]
    fn summary_names_the_source() {
        let seeded = SeedResult { loads_seeded: 2, total_loads: 7 };

        assert_eq!(
            summary(&seeded, None),
            "seeded 2 loads from built-in demo loads; load board now holds 7"
        );
        assert_eq!(
            summary(&seeded, Some(Path::new("loads.json"))),
            "seeded 2 loads from loads.json; load board now holds 7"
        );
    }
}
