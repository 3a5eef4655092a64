use mot_core::{InputEvent, Key, NamedColor, SessionPhase, SurfaceError};
use mot_experiment::testing::ScriptedSurface;
use mot_experiment::{ExperimentConfig, ExperimentError, Session};
use mot_timing::SteppedTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::time::Duration;

fn config(dir: &std::path::Path) -> ExperimentConfig {
    ExperimentConfig {
        output_dir: dir.to_path_buf(),
        ..ExperimentConfig::default()
    }
}

/// Wait screen, then per trial an instruction screen and a typed count,
/// the probe questionnaire after the last trial, and the debrief screen.
fn full_script(counts: [&str; 3], answers: [&str; 3]) -> ScriptedSurface {
    let mut surface = ScriptedSurface::default().any_key();
    for count in counts {
        surface = surface.any_key().type_line(count);
    }
    for answer in answers {
        surface = surface.click(answer);
    }
    surface.any_key()
}

fn read_csv(path: &std::path::Path) -> Vec<(String, String)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().clone();
    let mut records = reader.records();
    let values = records.next().unwrap().unwrap();
    assert!(records.next().is_none());
    header
        .iter()
        .zip(values.iter())
        .map(|(h, v)| (h.to_string(), v.to_string()))
        .collect()
}

#[test]
fn session_writes_one_row_with_probe_answers() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new("s07", "2026_Oct_18_1432", config(dir.path())).unwrap();
    let mut surface = full_script(["3", "12", "0"], ["no", "circle", "purple"]);
    let mut timer = SteppedTimer::new(Duration::from_millis(10));
    let mut rng = StdRng::seed_from_u64(42);

    let path = session.run(&mut surface, &mut timer, &mut rng).unwrap();

    assert_eq!(path, dir.path().join("s07_2026_Oct_18_1432_ib_data.csv"));
    assert_eq!(surface.remaining_steps(), 0);
    assert_eq!(session.phase(), SessionPhase::Finished);
    assert!(
        surface
            .shown_text()
            .iter()
            .any(|t| t.starts_with("Thank you for your participation."))
    );

    let row = read_csv(&path);
    let get = |column: &str| {
        row.iter()
            .find(|(h, _)| h == column)
            .map(|(_, v)| v.as_str())
            .unwrap()
    };
    assert_eq!(get("attended_color"), "white");
    assert_eq!(get("attended_shape"), "shapes");
    assert_eq!(get("ib_color"), "purple");
    assert_eq!(get("ib_shape"), "cross");
    assert_eq!(get("count_0"), "3");
    assert_eq!(get("count_1"), "12");
    assert_eq!(get("count_2"), "0");
    assert_eq!(get("reported_noticing"), "no");
    assert_eq!(get("reported_shape"), "circle");
    assert_eq!(get("reported_color"), "purple");
    for outcome in session.outcomes() {
        let column = format!("bounces_{}", outcome.trial_id);
        assert_eq!(get(&column), outcome.bounces.to_string());
    }
    assert_eq!(row.len(), 4 + 2 * 3 + 3);
}

#[test]
fn only_the_last_trial_is_a_probe() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new("s08", "d", config(dir.path())).unwrap();
    let mut surface = full_script(["1", "2", "3"], ["yes", "cross", "purple"]);
    let mut timer = SteppedTimer::new(Duration::from_millis(10));
    let mut rng = StdRng::seed_from_u64(8);
    session.run(&mut surface, &mut timer, &mut rng).unwrap();

    let probes: Vec<bool> = session.outcomes().iter().map(|o| o.probe.is_some()).collect();
    assert_eq!(probes, [false, false, true]);
    let report = session.outcomes()[2].probe.as_ref().unwrap();
    assert_eq!(report.noticed, "yes");
    assert_eq!(report.shape, "cross");
    assert_eq!(report.color, "purple");
}

#[test]
fn escape_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new("s09", "d", config(dir.path())).unwrap();
    let mut surface = ScriptedSurface::default()
        .any_key()
        .any_key()
        .events([InputEvent::Key(Key::Digit(2)), InputEvent::Key(Key::Escape)]);
    let mut timer = SteppedTimer::new(Duration::from_millis(10));
    let mut rng = StdRng::seed_from_u64(9);

    let err = session.run(&mut surface, &mut timer, &mut rng).unwrap_err();
    assert!(matches!(err, ExperimentError::Surface(SurfaceError::Aborted)));
    assert!(!session.output_path().exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExperimentConfig {
        num_trials: 1,
        trial_duration_s: 1.0,
        output_dir: dir.path().join("does-not-exist"),
        ..ExperimentConfig::default()
    };
    let mut session = Session::new("s10", "d", config).unwrap();
    let mut surface = ScriptedSurface::default()
        .any_key()
        .any_key()
        .type_line("4")
        .click("no")
        .click("square")
        .click("tan");
    let mut timer = SteppedTimer::new(Duration::from_millis(10));
    let mut rng = StdRng::seed_from_u64(10);

    let err = session.run(&mut surface, &mut timer, &mut rng).unwrap_err();
    assert!(matches!(err, ExperimentError::Write { .. }));
    assert_eq!(session.phase(), SessionPhase::Saving);
    assert!(
        !surface
            .shown_text()
            .iter()
            .any(|t| t.starts_with("Thank you"))
    );
}

#[test]
fn random_attended_colour_flows_into_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let config = config(dir.path()).with_random_attended_color(&mut rng);
    let color = config.attended_color;
    assert!(matches!(color, NamedColor::White | NamedColor::Black));
    let session = Session::new("s11", "d", config).unwrap();
    assert!(session.instructions().contains(&format!("the {color} shapes bounce")));
}
