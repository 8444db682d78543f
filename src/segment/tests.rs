use proptest::prelude::*;

use super::bodies::{capture_blocks, label_pattern};
use super::names::{collect_solution_names, region_between_tokens};
use super::*;
use crate::pdf::StyledSpan;
use crate::pdf::fake::{FakeManual, FakePage};

const TARGET: &str = "ABV 000629.12 — Control Software, Internal Fault";
const NEXT: &str = "ABV 000841.07 — GPS Lock Fault";

fn segmenter() -> DtcSegmenter {
    DtcSegmenter::new().expect("segmenter regexes should compile")
}

fn service_manual() -> FakeManual {
    let first_page = FakePage::new(
        r#"<page number="171">
<text top="50" left="10"><b>ABV 000629.12 — Control Software, Internal Fault</b></text>
<text top="70" left="10">Alarm Response: the controller reports an internal fault.</text>
<text top="90" left="10"><b>•</b></text>
<text top="90" left="20"><b>1Replace Control Unit</b></text>
<text top="110" left="20">Install a new control unit.</text>
<text top="130" left="10"><b>•</b></text>
<text top="130" left="20"><b>2</b></text>
<text top="130" left="30"><b>Reprogram Controller</b></text>
<text top="150" left="20">Reprogram the controller using the service tool.</text>
</page>"#,
        &[
            "ABV 000629.12 —\nControl Software, Internal Fault",
            "Alarm Response: the controller reports an internal fault.",
            "1 Replace Control Unit",
            "Install a new control unit.\nOK: Fault cleared, return to service.",
            "NOT OK: Go to next step. •",
            "• Use only approved software.",
            "2 Reprogram Controller",
            "2. Reprogram the controller using the service tool. •",
            "Diagnostics",
            "TM411919 -19-29MAR12-4/12",
            "Page footer 171",
        ],
    );
    let second_page = FakePage::new(
        r#"<page number="172">
<text top="50" left="10"><b>ABV 000841.07 — GPS Lock Fault</b></text>
<text top="90" left="10"><b>•</b></text>
<text top="90" left="20"><b>1Check Antenna</b></text>
<text top="110" left="20">Inspect the antenna cable.</text>
</page>"#,
        &[
            "ABV 000841.07 — GPS Lock Fault",
            "1 Check Antenna",
            "Inspect the antenna cable.",
            "Page footer 172",
        ],
    );
    let third_page = FakePage::new(
        r#"<page number="173"><text top="50" left="10">Unrelated</text></page>"#,
        &["Unrelated", "Page footer 173"],
    );

    FakeManual {
        pages: vec![first_page, second_page, third_page],
        outline: Vec::new(),
    }
}

fn boundary(target: &str, next: Option<&str>) -> SectionBoundary {
    SectionBoundary {
        start_page: 0,
        end_page: 0,
        target_label: target.to_string(),
        next_label: next.map(ToOwned::to_owned),
    }
}

fn span(text: &str, bold: bool) -> StyledSpan {
    StyledSpan {
        text: text.to_string(),
        bold,
    }
}

#[test]
fn extract_segments_names_and_cleaned_bodies_between_codes() {
    let extracted = segmenter()
        .extract(&service_manual(), &boundary(TARGET, Some(NEXT)))
        .expect("extraction should succeed");

    assert_eq!(
        extracted.solution_names,
        vec!["Replace Control Unit", "Reprogram Controller"]
    );
    assert_eq!(
        extracted.solutions,
        vec![
            "",
            "Install a new control unit.",
            "",
            "Reprogram the controller using the service tool."
        ]
    );
}

#[test]
fn extract_without_next_label_runs_to_the_end_of_both_views() {
    let extracted = segmenter()
        .extract(&service_manual(), &boundary(TARGET, None))
        .expect("extraction should succeed");

    assert_eq!(
        extracted.solution_names,
        vec!["Replace Control Unit", "Reprogram Controller", "Check Antenna"]
    );
    assert_eq!(extracted.solutions.last().map(String::as_str), Some("Unrelated"));
    assert!(
        extracted
            .solutions
            .contains(&"Inspect the antenna cable.".to_string())
    );
}

#[test]
fn extract_is_empty_when_next_code_precedes_target() {
    let extracted = segmenter()
        .extract(&service_manual(), &boundary(NEXT, Some(TARGET)))
        .expect("extraction should succeed");

    assert!(extracted.is_empty());
}

#[test]
fn extract_is_empty_for_labels_without_code_token() {
    let segmenter = segmenter();
    let manual = service_manual();

    let no_target = segmenter
        .extract(&manual, &boundary("Control Software, Internal Fault", Some(NEXT)))
        .expect("extraction should succeed");
    assert!(no_target.is_empty());

    let no_next = segmenter
        .extract(&manual, &boundary(TARGET, Some("GPS Lock Fault")))
        .expect("extraction should succeed");
    assert!(no_next.is_empty());
}

#[test]
fn extract_is_empty_when_target_token_is_absent_from_pages() {
    let extracted = segmenter()
        .extract(
            &service_manual(),
            &boundary("ABV 000999.01 — Missing Code", Some(NEXT)),
        )
        .expect("extraction should succeed");
    assert!(extracted.is_empty());
}

#[test]
fn extract_bodies_are_empty_without_solution_names() {
    let mut manual = service_manual();
    manual.pages[0].markup = manual.pages[0].markup.replace("<b>•</b>", "•");

    let extracted = segmenter()
        .extract(&manual, &boundary(TARGET, Some(NEXT)))
        .expect("extraction should succeed");
    assert!(extracted.solution_names.is_empty());
    assert!(extracted.solutions.is_empty());
}

#[test]
fn extract_clamps_widened_range_to_document_end() {
    let extracted = segmenter()
        .extract(
            &service_manual(),
            &SectionBoundary {
                start_page: 1,
                end_page: 2,
                target_label: NEXT.to_string(),
                next_label: None,
            },
        )
        .expect("pages past the end should never be requested");

    assert_eq!(extracted.solution_names, vec!["Check Antenna"]);
    assert_eq!(
        extracted.solutions,
        vec!["", "Inspect the antenna cable.", "Unrelated"]
    );
}

#[test]
fn widened_pages_extend_two_pages_past_the_end() {
    let section = SectionBoundary {
        start_page: 10,
        end_page: 12,
        target_label: TARGET.to_string(),
        next_label: None,
    };
    assert_eq!(widened_pages(100, &section), 10..15);
    assert_eq!(widened_pages(13, &section), 10..13);
    assert_eq!(widened_pages(5, &section), 5..5);
}

#[test]
fn code_token_extracts_structured_part_of_label() {
    let segmenter = segmenter();
    assert_eq!(segmenter.code_token(TARGET), Some("ABV 000629.12"));
    assert_eq!(
        segmenter.code_token("ECU 523456-05 — Sensor Supply"),
        Some("ECU 523456-05")
    );
    assert_eq!(segmenter.code_token("Diagnostic Trouble Codes"), None);
}

#[test]
fn region_between_tokens_requires_end_after_start() {
    let markup = "aa ABV 000629.12 bb ABV 000841.07 cc";
    assert_eq!(
        region_between_tokens(markup, "ABV 000629.12", Some("ABV 000841.07")),
        Some(" bb ")
    );
    assert_eq!(
        region_between_tokens(markup, "ABV 000629.12", None),
        Some(" bb ABV 000841.07 cc")
    );
    assert_eq!(
        region_between_tokens(markup, "ABV 000841.07", Some("ABV 000629.12")),
        None
    );
    assert_eq!(
        region_between_tokens(markup, "ABV 000629.12", Some("ABV 000629.12")),
        None
    );
    assert_eq!(region_between_tokens(markup, "XYZ 000000.00", None), None);
}

#[test]
fn unclosed_streak_is_dropped() {
    let spans = vec![
        span("•", true),
        span("1Replace Control Unit", true),
        span("Body", false),
        span("•", true),
        span("2Reprogram Controller", true),
    ];
    assert_eq!(collect_solution_names(&spans), vec!["Replace Control Unit"]);
}

#[test]
fn bullet_resets_an_open_streak() {
    let spans = vec![
        span("•", true),
        span("1Stale", true),
        span("•", true),
        span("2", true),
        span("Fresh Name", true),
        span("Body", false),
        span("Plain", false),
        span("Bold but idle", true),
    ];
    assert_eq!(collect_solution_names(&spans), vec!["Fresh Name"]);
}

#[test]
fn plain_bullet_does_not_open_a_streak() {
    let spans = vec![span("•", false), span("1Name", true), span("Body", false)];
    assert!(collect_solution_names(&spans).is_empty());
}

#[test]
fn whitespace_runs_do_not_close_a_streak() {
    let scanner = MarkupScanner::new().expect("markup scanner should compile");
    let spans = scanner.styled_spans(
        r#"<text><b>•</b></text><text> </text><text><b>1Replace</b></text><text>&#160;</text><text><b>Pump</b></text><text>Body</text>"#,
    );

    assert_eq!(spans.len(), 4);
    assert_eq!(collect_solution_names(&spans), vec!["Replace Pump"]);
}

#[test]
fn label_pattern_tolerates_wrapped_lines_and_literal_metacharacters() {
    let pattern = label_pattern("ABV 000629.12 — Fault (Internal)").expect("pattern should compile");
    assert!(pattern.is_match("ABV 000629.12 —\nFault (Internal)"));
    assert!(!pattern.is_match("ABV 000629x12 — Fault (Internal)"));
}

#[test]
fn capture_blocks_skips_repeated_target_headings() {
    let blocks = vec![
        "Intro".to_string(),
        "ABV 000629.12 — Fault".to_string(),
        "First".to_string(),
        "ABV 000629.12 — Fault".to_string(),
        "Second".to_string(),
        "ABV 000841.07 — Next".to_string(),
        "Third".to_string(),
    ];
    let target = label_pattern("ABV 000629.12 — Fault").expect("pattern should compile");
    let next = label_pattern("ABV 000841.07 — Next").expect("pattern should compile");

    assert_eq!(
        capture_blocks(&blocks, &target, Some(&next)),
        vec!["First", "Second"]
    );
    assert_eq!(
        capture_blocks(&blocks, &target, None),
        vec!["First", "Second", "ABV 000841.07 — Next", "Third"]
    );

    let missing = label_pattern("ABV 000111.01 — Other").expect("pattern should compile");
    assert!(capture_blocks(&blocks, &missing, Some(&next)).is_empty());
}

#[test]
fn clean_block_strips_markers_and_filters_noise() {
    let segmenter = segmenter();
    let names = regex::Regex::new(r"^\d* ?(?:Replace Control Unit|Reprogram Controller)")
        .expect("names regex should compile");

    assert_eq!(
        segmenter.clean_block("3. Replace Control Unit\nthen cycle power •", &names),
        Some("then cycle power".to_string())
    );
    assert_eq!(
        segmenter.clean_block("Check wiring.\nNOT OK: replace harness", &names),
        Some("Check wiring.".to_string())
    );
    assert_eq!(segmenter.clean_block("OK to continue", &names), None);
    assert_eq!(segmenter.clean_block("• bullet", &names), None);
    assert_eq!(segmenter.clean_block("Diagnostics", &names), None);
    assert_eq!(
        segmenter.clean_block("Engine Controller TM411919 -19-29MAR12-3/12", &names),
        None
    );
    assert_eq!(
        segmenter.clean_block("1 Replace Control Unit", &names),
        Some(String::new())
    );
    assert_eq!(
        segmenter.clean_block("2Reprogram Controller", &names),
        Some(String::new())
    );
}

fn noisy_block() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}( [a-z]{1,10}){0,4}",
        "OK[: ][a-z ]{0,20}",
        "NOT OK: [a-z ]{0,20}",
        "• [a-z ]{0,20}",
        Just("Diagnostics".to_string()),
        "[0-9]{1,2}\\. [a-z ]{1,20}",
        "[a-z ]{1,20}\nOK: [a-z ]{0,20}",
        "[0-9] ?Replace Control Unit( [a-z]{1,10})?",
        "[a-z ]{1,20} -19-29MAR12-[0-9]/[0-9]{2}",
    ]
}

fn manual_with_blocks(body_blocks: &[String]) -> FakeManual {
    let mut manual = service_manual();
    let mut blocks = vec![
        TARGET.to_string(),
        "1 Replace Control Unit".to_string(),
    ];
    blocks.extend(body_blocks.iter().cloned());
    blocks.push("footer".to_string());
    manual.pages[0].blocks = blocks;
    manual
}

proptest! {
    #[test]
    fn labels_without_code_token_yield_nothing(label in "[a-z ,—]{0,40}") {
        let extracted = segmenter()
            .extract(&service_manual(), &boundary(&label, Some(NEXT)))
            .expect("extraction should succeed");
        prop_assert!(extracted.is_empty());
    }

    #[test]
    fn extract_is_idempotent(start in 0usize..3, span_pages in 0usize..3, with_next in any::<bool>()) {
        let segmenter = segmenter();
        let manual = service_manual();
        let section = SectionBoundary {
            start_page: start,
            end_page: start + span_pages,
            target_label: TARGET.to_string(),
            next_label: with_next.then(|| NEXT.to_string()),
        };

        let first = segmenter.extract(&manual, &section).expect("extraction should succeed");
        let second = segmenter.extract(&manual, &section).expect("extraction should succeed");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn solutions_never_carry_layout_noise(body_blocks in proptest::collection::vec(noisy_block(), 0..10)) {
        let extracted = segmenter()
            .extract(&manual_with_blocks(&body_blocks), &boundary(TARGET, Some(NEXT)))
            .expect("extraction should succeed");

        if extracted.solution_names.is_empty() {
            prop_assert!(extracted.solutions.is_empty());
        }
        for solution in &extracted.solutions {
            prop_assert!(!solution.starts_with("OK"));
            prop_assert!(!solution.starts_with("NOT OK:"));
            prop_assert!(!solution.starts_with('•'));
            prop_assert_ne!(solution.as_str(), "Diagnostics");
        }
    }
}
