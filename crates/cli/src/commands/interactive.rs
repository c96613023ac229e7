//! Interactive session driving the Home / TorqueOnly / Custom screens
//!
//! Each line read from stdin is one action. Switching modes starts over
//! from that mode's sample input.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use screw_lib::models::{FeatureName, SeriesFeature};
use screw_lib::requests::mode_catalog;
use screw_lib::session::{Form, Mode, Session, Submission};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{ApiClient, ApiError};
use crate::output::{
    print_error, print_info, print_modes, print_prediction, print_rejection, print_success,
    OutputFormat,
};

const HELP: &str = "\
Commands:
  mode <home|torque|custom>        switch screen (discards unsubmitted input)
  time <t1,t2,...>                 set the shared timestamps
  set <series> <v1,v2,...>         set torque, angle, gradient or step values
  enable <feature|metadata>        include a feature (custom mode)
  disable <feature|metadata>       exclude a feature (custom mode)
  meta <field> <value>             choose a metadata value (custom mode)
  show                             print the current screen
  submit                           send the current input for prediction
  help                             print this help
  quit                             leave the session";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Mode(Mode),
    Time(String),
    Series(SeriesFeature, String),
    Toggle(FeatureName, bool),
    ToggleMetadata(bool),
    Metadata(FeatureName, String),
    Show,
    Submit,
    Help,
    Quit,
}

fn metadata_field(name: &str) -> Result<FeatureName> {
    let field = match name {
        "location" => FeatureName::WorkpieceLocation,
        "usage" => FeatureName::WorkpieceUsage,
        "result" => FeatureName::WorkpieceResult,
        "condition" => FeatureName::ScenarioCondition,
        "exception" => FeatureName::ScenarioException,
        other => other.parse()?,
    };
    if field.is_series() {
        bail!("{} is a series, not a metadata field", field);
    }
    Ok(field)
}

fn feature(name: &str) -> Result<FeatureName> {
    if let Ok(series) = name.parse::<SeriesFeature>() {
        return Ok(series.name());
    }
    metadata_field(name)
}

fn split_argument(rest: &str, usage: &str) -> Result<(String, String)> {
    match rest.split_once(char::is_whitespace) {
        Some((head, tail)) if !tail.trim().is_empty() => {
            Ok((head.to_string(), tail.trim().to_string()))
        }
        _ => bail!("usage: {}", usage),
    }
}

pub fn parse_action(line: &str) -> Result<Action> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let action = match command {
        "mode" => Action::Mode(rest.parse()?),
        "home" => Action::Mode(Mode::Home),
        "time" => Action::Time(rest.to_string()),
        "set" => {
            let (series, text) = split_argument(rest, "set <series> <values>")?;
            Action::Series(series.parse()?, text)
        }
        "enable" | "disable" => {
            let enabled = command == "enable";
            match rest {
                "" => bail!("usage: {} <feature|metadata>", command),
                "metadata" => Action::ToggleMetadata(enabled),
                name => Action::Toggle(feature(name)?, enabled),
            }
        }
        "meta" => {
            let (field, value) = split_argument(rest, "meta <field> <value>")?;
            Action::Metadata(metadata_field(&field)?, value)
        }
        "show" => Action::Show,
        "submit" => Action::Submit,
        "help" | "?" => Action::Help,
        "quit" | "exit" => Action::Quit,
        other => bail!("unknown command '{}', type 'help' for a list", other),
    };
    Ok(action)
}

fn marker(enabled: bool) -> String {
    if enabled {
        "[x]".green().to_string()
    } else {
        "[ ]".dimmed().to_string()
    }
}

fn print_form(mode: Mode, form: &Form) {
    let title = match mode {
        Mode::TorqueOnly => "Torque-Only Classification",
        _ => "Custom Feature Classification",
    };
    println!("{}", title.bold());
    println!("{}", "=".repeat(60));
    println!("  time:        {}", form.time);

    for (series, text) in &form.series {
        let enabled = form.selection.is_enabled(series.name());
        println!("  {} {:<10} {}", marker(enabled), series.label(), text);
    }

    if mode == Mode::Custom {
        for field in FeatureName::METADATA {
            if let Some(value) = form.metadata.value_for(field) {
                let enabled = form.selection.is_enabled(field);
                println!("  {} {:<20} {}", marker(enabled), field.as_str(), value);
            }
        }
    }
}

fn print_screen(session: &Session) {
    match session.form() {
        Some(form) => print_form(session.mode(), form),
        None => {
            println!("{}", "Screw Tightening Classification".bold());
            println!("{}", "=".repeat(60));
            print_modes(&mode_catalog(), OutputFormat::Table);
            println!("Choose a screen with 'mode torque' or 'mode custom'.");
        }
    }
}

async fn submit(session: &Session, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = match session.submission()? {
        Submission::Torque(request) => client.predict_torque(&request).await,
        Submission::Custom(request) => client.predict_custom(&request).await,
    };

    match result {
        Ok(prediction) => {
            print_prediction(&prediction, format);
            Ok(())
        }
        Err(e) => match e.downcast_ref::<ApiError>().and_then(ApiError::rejection) {
            Some(rejection) => {
                print_rejection(rejection);
                Ok(())
            }
            None => Err(e),
        },
    }
}

async fn apply(
    session: &mut Session,
    action: Action,
    client: &ApiClient,
    format: OutputFormat,
) -> Result<()> {
    match action {
        Action::Mode(mode) => {
            session.select(mode);
            print_screen(session);
        }
        Action::Time(text) => session.set_time(text)?,
        Action::Series(series, text) => session.set_series(series, text)?,
        Action::Toggle(feature, enabled) => session.toggle(feature, enabled)?,
        Action::ToggleMetadata(enabled) => session.toggle_metadata(enabled)?,
        Action::Metadata(field, value) => session.set_metadata(field, &value)?,
        Action::Show => print_screen(session),
        Action::Submit => submit(session, client, format).await?,
        Action::Help => println!("{}", HELP),
        Action::Quit => {}
    }
    Ok(())
}

fn prompt(session: &Session) -> Result<()> {
    print!("{}> ", session.mode().to_string().cyan());
    std::io::stdout().flush().context("Failed to write prompt")
}

/// Run the session until `quit` or end of input
pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let mut session = Session::new();
    print_info(&format!("Connected to {}", client.base_url()));
    print_screen(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&session)?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_action(&line) {
            Ok(Action::Quit) => break,
            Ok(action) => {
                if let Err(e) = apply(&mut session, action, client, format).await {
                    print_error(&format!("{:#}", e));
                }
            }
            Err(e) => print_error(&e.to_string()),
        }
    }

    print_success("Session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_action("mode torque").unwrap(), Action::Mode(Mode::TorqueOnly));
        assert_eq!(parse_action("  mode custom ").unwrap(), Action::Mode(Mode::Custom));
        assert_eq!(parse_action("home").unwrap(), Action::Mode(Mode::Home));
        assert!(parse_action("mode settings").is_err());
    }

    #[test]
    fn test_parse_series_keeps_spaces_in_text() {
        assert_eq!(
            parse_action("set angle 1.0, 2.0 ,3.0").unwrap(),
            Action::Series(SeriesFeature::Angle, "1.0, 2.0 ,3.0".to_string())
        );
        assert_eq!(
            parse_action("set torque_values 1,2").unwrap(),
            Action::Series(SeriesFeature::Torque, "1,2".to_string())
        );
        assert!(parse_action("set angle").is_err());
        assert!(parse_action("set pressure 1,2").is_err());
    }

    #[test]
    fn test_parse_time_may_be_empty() {
        assert_eq!(parse_action("time").unwrap(), Action::Time(String::new()));
    }

    #[test]
    fn test_parse_toggles() {
        assert_eq!(
            parse_action("disable gradient").unwrap(),
            Action::Toggle(FeatureName::GradientValues, false)
        );
        assert_eq!(
            parse_action("enable usage").unwrap(),
            Action::Toggle(FeatureName::WorkpieceUsage, true)
        );
        assert_eq!(
            parse_action("disable metadata").unwrap(),
            Action::ToggleMetadata(false)
        );
        assert!(parse_action("enable").is_err());
    }

    #[test]
    fn test_parse_metadata() {
        assert_eq!(
            parse_action("meta location middle").unwrap(),
            Action::Metadata(FeatureName::WorkpieceLocation, "middle".to_string())
        );
        assert_eq!(
            parse_action("meta scenario_exception 1").unwrap(),
            Action::Metadata(FeatureName::ScenarioException, "1".to_string())
        );
        assert!(parse_action("meta torque 1").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_action("predict").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
        assert_eq!(parse_action("exit").unwrap(), Action::Quit);
    }

    #[test]
    fn test_actions_drive_session() {
        let mut session = Session::new();
        for line in ["mode custom", "disable angle", "meta result NOK"] {
            match parse_action(line).unwrap() {
                Action::Mode(mode) => session.select(mode),
                Action::Toggle(feature, enabled) => session.toggle(feature, enabled).unwrap(),
                Action::Metadata(field, value) => session.set_metadata(field, &value).unwrap(),
                other => panic!("unexpected action {:?}", other),
            }
        }

        let Submission::Custom(request) = session.submission().unwrap() else {
            panic!("expected custom submission");
        };
        assert!(!request.series.contains_key(&SeriesFeature::Angle));
        assert_eq!(
            request.metadata.workpiece_result,
            Some(screw_lib::models::WorkpieceResult::Nok)
        );
    }
}
