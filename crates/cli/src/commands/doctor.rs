use quotecraft_core::config::{AppConfig, LoadOptions};
use quotecraft_core::cpq::catalog::RateCatalog;
use quotecraft_core::cpq::onsite::OnsiteServiceTable;
use serde::Serialize;

use crate::commands::{to_data, CommandResult, EXIT_CATALOG, EXIT_CONFIG};

const COMMAND: &str = "doctor";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions) -> CommandResult {
    let report = build_report(options);
    let exit_code = exit_code_for(&report);
    let data = match to_data(COMMAND, &report) {
        Ok(data) => data,
        Err(result) => return result,
    };

    if exit_code == 0 {
        CommandResult::success_with_data(COMMAND, report.summary, data)
    } else {
        let error_class = if exit_code == EXIT_CONFIG { "config_validation" } else { "catalog_load" };
        CommandResult::failure_with_data(COMMAND, error_class, report.summary, exit_code, data)
    }
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_rate_catalog(&config));
            checks.push(check_onsite_table(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["rate_catalog", "onsite_table"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_rate_catalog(config: &AppConfig) -> DoctorCheck {
    match RateCatalog::load(&config.catalog.path) {
        Ok(catalog) if catalog.is_empty() => DoctorCheck {
            name: "rate_catalog",
            status: CheckStatus::Fail,
            details: format!("`{}` loaded but holds no rates", config.catalog.path.display()),
        },
        Ok(catalog) => DoctorCheck {
            name: "rate_catalog",
            status: CheckStatus::Pass,
            details: format!(
                "loaded {} rates from `{}`",
                catalog.len(),
                config.catalog.path.display()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "rate_catalog", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_onsite_table(config: &AppConfig) -> DoctorCheck {
    match OnsiteServiceTable::load(&config.catalog.onsite_path) {
        Ok(table) => DoctorCheck {
            name: "onsite_table",
            status: CheckStatus::Pass,
            details: format!(
                "loaded {} service categories from `{}`",
                table.categories().count(),
                config.catalog.onsite_path.display()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "onsite_table", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn exit_code_for(report: &DoctorReport) -> u8 {
    let failed = |name: &str| {
        report.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
    };

    if failed("config_validation") {
        EXIT_CONFIG
    } else if failed("rate_catalog") || failed("onsite_table") {
        EXIT_CATALOG
    } else {
        0
    }
}
