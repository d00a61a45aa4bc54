use agora_richtext::{
    AttrSet, ContentNode, Delta, FontBounds, Mention, Op, Payload, Run, Style,
    render_delta_markup, render_payload_to_html, serialize_tree,
};

fn styled(text: &str, runs: Vec<Run>) -> Payload {
    Payload::new(text, runs)
}

#[test]
fn renders_full_wrapper_stack() {
    let style = Style {
        bold: true,
        italic: true,
        color: "#ff0000".into(),
        font_size: 20,
        link: "https://example.com/a?b=1".into(),
        ..Style::default()
    };
    let payload = styled(
        "Hello <world>",
        vec![Run::new(0, 5, style), Run::new(5, 13, Style::default())],
    );
    insta::assert_snapshot!(
        render_payload_to_html(&payload),
        @r#"<a href="https://example.com/a?b=1" target="_blank" rel="noopener noreferrer"><span style="color: #ff0000; font-size: 20px"><em><strong>Hello</strong></em></span></a> &lt;world&gt;"#
    );
}

#[test]
fn renders_line_breaks_inside_wrappers() {
    let style = Style {
        underline: true,
        strikethrough: true,
        ..Style::default()
    };
    let payload = Payload::styled("line one\nline two", style);
    insta::assert_snapshot!(
        render_payload_to_html(&payload),
        @"<u><s>line one<br>line two</s></u>"
    );
}

#[test]
fn gaps_render_unstyled() {
    let bold = Style {
        bold: true,
        ..Style::default()
    };
    let payload = styled("ab cd", vec![Run::new(3, 5, bold)]);
    insta::assert_snapshot!(render_payload_to_html(&payload), @"ab <strong>cd</strong>");
}

#[test]
fn quote_in_link_cannot_break_out_of_attribute() {
    let style = Style {
        link: "https://example.com/\"onmouseover=alert(1)".into(),
        ..Style::default()
    };
    let html = render_payload_to_html(&Payload::styled("x", style));
    assert!(html.contains("%22onmouseover"));
    assert!(!html.contains("\"onmouseover"));
}

#[test]
fn hostile_text_is_escaped() {
    let html = render_payload_to_html(&Payload::plain("<script>alert(1)</script>"));
    insta::assert_snapshot!(html, @"&lt;script&gt;alert(1)&lt;/script&gt;");
}

#[test]
fn delta_markup_matches_editor_layout() {
    let bold = AttrSet {
        bold: true,
        ..AttrSet::default()
    };
    let quote = AttrSet {
        blockquote: true,
        ..AttrSet::default()
    };
    let delta = Delta::new(vec![
        Op::text("Hi "),
        Op::mention(Mention::new("u1", "ann").unwrap()),
        Op::text(", "),
        Op::styled("welcome", bold),
        Op::text("\nquoted"),
        Op::styled("\n", quote),
    ]);
    insta::assert_snapshot!(
        render_delta_markup(&delta, FontBounds::default()),
        @r#"<p>Hi <span class="mention" data-uid="u1">@ann</span>, <strong>welcome</strong></p><blockquote>quoted</blockquote>"#
    );
}

#[test]
fn pasted_tree_renders_like_typed_content() {
    let tree = ContentNode::element(
        "div",
        vec![
            ContentNode::element("p", vec![ContentNode::text("first")]),
            ContentNode::element(
                "p",
                vec![ContentNode::element("b", vec![ContentNode::text("second")])],
            ),
        ],
    );
    let payload = serialize_tree(&tree);
    insta::assert_snapshot!(
        render_payload_to_html(&payload),
        @"first<br><strong>second</strong>"
    );
}
