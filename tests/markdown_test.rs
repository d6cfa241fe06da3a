//! Renderer behavior on realistic assistant replies.

use eugene_chat::markdown::{bullet_lists, escape_html, fenced_code_blocks, render};
use insta::assert_snapshot;

#[test]
fn bold_and_italic() {
    let html = render("**bold** and *italic*");
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains("<em>italic</em>"));
    assert!(!html.contains('*'));
    assert_snapshot!(html, @"<strong>bold</strong> and <em>italic</em>");
}

#[test]
fn script_tags_are_escaped() {
    let html = render("<script>alert('x')</script>");
    assert!(!html.contains("<script>"));
    assert_snapshot!(html, @"&lt;script&gt;alert('x')&lt;/script&gt;");
}

#[test]
fn ampersands_are_escaped_once() {
    assert_eq!(render("Tom & Jerry"), "Tom &amp; Jerry");
    assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
}

#[test]
fn fenced_block_keeps_contents_literal() {
    let html = render("```js\nconst a = `b` && **c**;\n```");
    assert!(html.contains("class=\"language-js\""));
    assert!(!html.contains("<code>b</code>"));
    assert!(!html.contains("<strong>"));
    assert_snapshot!(
        html,
        @r#"<pre><code class="language-js">const a = &#96;b&#96; &amp;&amp; **c**;</code></pre>"#
    );
}

#[test]
fn fenced_block_without_language() {
    let html = render("```\nplain <b>\n```\nafter");
    assert_snapshot!(html, @"<pre><code>plain &lt;b&gt;</code></pre>after");
}

#[test]
fn fenced_code_blocks_rule_alone() {
    let html = fenced_code_blocks("```py\nprint(1)\n```");
    assert_eq!(html, "<pre><code class=\"language-py\">print(1)</code></pre>");
}

#[test]
fn three_bullets_make_one_list() {
    let html = render("Options:\n• one\n• two\n• three");
    assert_eq!(html.matches("<ul>").count(), 1);
    assert_eq!(html.matches("<li>").count(), 3);
    assert_snapshot!(html, @"Options:<br><ul><li>one</li><li>two</li><li>three</li></ul>");
}

#[test]
fn blank_lines_before_bullets_collapse() {
    let html = render("Intro\n\n\n• a\n• b");
    assert_snapshot!(html, @"Intro<br><ul><li>a</li><li>b</li></ul>");
}

#[test]
fn bullet_rule_leaves_plain_lines() {
    assert_eq!(bullet_lists("no bullets here"), "no bullets here");
}

#[test]
fn headings_of_each_level() {
    let html = render("## Sub\n### Minor");
    assert_snapshot!(html, @"<h2>Sub</h2><br><h3>Minor</h3>");
}

#[test]
fn inline_code_spans() {
    assert_eq!(render("Run `ls -la` now"), "Run <code>ls -la</code> now");
}

#[test]
fn only_http_links_become_anchors() {
    assert_eq!(
        render("[x](javascript:alert(1))"),
        "[x](javascript:alert(1))"
    );
}

#[test]
fn mixed_reply() {
    let html = render("# Title\nSome **bold** text\n• one\n• two\nSee [docs](https://example.com).");
    assert_snapshot!(
        html,
        @r#"<h1>Title</h1><br>Some <strong>bold</strong> text<br><ul><li>one</li><li>two</li></ul>See <a href="https://example.com" target="_blank" rel="noopener noreferrer">docs</a>."#
    );
}

#[test]
fn empty_input_renders_empty() {
    assert_eq!(render(""), "");
}

#[test]
fn asterisks_in_link_urls_stay_literal() {
    let html = render("See [docs](https://x.com/*a*b*c) now");
    assert_snapshot!(
        html,
        @r#"See <a href="https://x.com/*a*b*c" target="_blank" rel="noopener noreferrer">docs</a> now"#
    );

    let html = render("[report](https://x.com/**q**) and **this**");
    assert!(html.contains(r#"href="https://x.com/**q**""#));
    assert!(html.contains("<strong>this</strong>"));
}

#[test]
fn emphasis_may_wrap_a_link() {
    let html = render("*see [x](https://a.b) now*");
    assert_eq!(
        html,
        r#"<em>see <a href="https://a.b" target="_blank" rel="noopener noreferrer">x</a> now</em>"#
    );
}

#[test]
fn crlf_headings_drop_the_carriage_return() {
    let html = render("# Title\r\n## Sub\r\nbody");
    assert_eq!(html, "<h1>Title</h1><br><h2>Sub</h2><br>body");
}

#[test]
fn bullets_starting_with_bold_are_not_a_list() {
    // A list whose first item opens with a tag is left as plain lines
    let html = render("• **Hours**: 9-5\n• **Phone**: 555");
    assert!(!html.contains("<ul>"));
    assert_eq!(html, "• <strong>Hours</strong>: 9-5<br>• <strong>Phone</strong>: 555");

    let html = render("• Hours: **9-5**\n• Phone: 555");
    assert_eq!(html, "<ul><li>Hours: <strong>9-5</strong></li><li>Phone: 555</li></ul>");
}
