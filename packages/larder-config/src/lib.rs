mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Batch, Classifier, Config, Postgres, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_classifier(&cfg.classifier)?;

	if cfg.batch.page_size == 0 {
		return Err(Error::Validation {
			message: "batch.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.batch.concurrency == 0 {
		return Err(Error::Validation {
			message: "batch.concurrency must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

pub fn validate_classifier(classifier: &Classifier) -> Result<()> {
	for (label, value) in [
		("classifier.parent_thresh", classifier.parent_thresh),
		("classifier.leaf_thresh", classifier.leaf_thresh),
		("classifier.high_conf", classifier.high_conf),
		("classifier.internal_strong_min", classifier.internal_strong_min),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(-1.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range -1.0-1.0."),
			});
		}
	}

	if !classifier.branch_margin_min.is_finite() {
		return Err(Error::Validation {
			message: "classifier.branch_margin_min must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&classifier.branch_margin_min) {
		return Err(Error::Validation {
			message: "classifier.branch_margin_min must be in the range 0.0-2.0.".to_string(),
		});
	}

	for (label, value) in [
		("classifier.roots_to_explore", classifier.roots_to_explore),
		("classifier.beam_width", classifier.beam_width),
		("classifier.max_total", classifier.max_total),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let level = cfg.service.log_level.trim();

	if level.len() != cfg.service.log_level.len() {
		cfg.service.log_level = level.to_string();
	}
}
