//! Video embeds from `::youtube`, `::vimeo` and `::video` directives.

use crate::error::PassError;
use crate::mdast::{Directive, Node, NodeValue};
use crate::pass::{MarkdownPass, RunContext};

use super::names;

/// Turns video directives into embed nodes.
///
/// `::youtube[Title]{#id}` and `::vimeo[Title]{#id}` become iframes,
/// `::video[Title]{src="..."}` a native `<video>`. Directives without an
/// id or source are left for the generic fallback and a warning.
#[derive(Debug, Default)]
pub struct VideoEmbeds;

impl MarkdownPass for VideoEmbeds {
    fn name(&self) -> &'static str {
        names::VIDEO_EMBEDS
    }

    fn run(&self, tree: &mut Node, cx: &mut RunContext<'_>) -> Result<(), PassError> {
        let mut problems = Vec::new();
        tree.walk_mut(&mut |node| {
            let (NodeValue::LeafDirective(directive) | NodeValue::ContainerDirective(directive)) =
                &node.value
            else {
                return;
            };
            if !matches!(directive.name.as_str(), "youtube" | "vimeo" | "video") {
                return;
            }
            match embed(directive) {
                Some(embed) => {
                    *node = embed.with_position(node.position);
                }
                None => problems.push(format!(
                    "{} embed without an id or src: {}",
                    directive.name,
                    directive.args.to_syntax()
                )),
            }
        });
        for problem in problems {
            cx.warn(problem);
        }
        Ok(())
    }
}

fn embed(directive: &Directive) -> Option<Node> {
    let args = &directive.args;
    let id = args.id.as_deref().or_else(|| args.get("id"));
    let title = if args.label.is_empty() {
        "Video"
    } else {
        args.label.as_str()
    };

    let node = match directive.name.as_str() {
        "youtube" => iframe(
            &format!("https://www.youtube-nocookie.com/embed/{}", id?),
            title,
        ),
        "vimeo" => iframe(&format!("https://player.vimeo.com/video/{}", id?), title),
        _ => Node::new(NodeValue::Embed)
            .with_h_name("video")
            .with_h_property("src", args.get("src")?)
            .with_h_property("title", title)
            .with_h_property("controls", "")
            .with_h_property("preload", "metadata"),
    };
    Some(node.with_h_property("class", "video-embed"))
}

fn iframe(src: &str, title: &str) -> Node {
    Node::new(NodeValue::Embed)
        .with_h_name("iframe")
        .with_h_property("src", src)
        .with_h_property("title", title)
        .with_h_property("loading", "lazy")
        .with_h_property(
            "allow",
            "accelerometer; autoplay; clipboard-write; encrypted-media; picture-in-picture",
        )
        .with_h_property("allowfullscreen", "")
}
