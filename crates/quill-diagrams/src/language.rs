//! Diagram languages Kroki can render.

use std::fmt;

/// Diagram language of a code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramLanguage {
    Mermaid,
    PlantUml,
    C4PlantUml,
    GraphViz,
    D2,
    Ditaa,
    Erd,
    Nomnoml,
    Svgbob,
    WaveDrom,
    BlockDiag,
    SeqDiag,
}

impl DiagramLanguage {
    /// Parse a fence language.
    ///
    /// A `kroki-` prefix is accepted, so `kroki-mermaid` and `mermaid` are
    /// the same language. Matching ignores ASCII case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lang = s.trim().to_ascii_lowercase();
        let lang = lang.strip_prefix("kroki-").unwrap_or(&lang);

        match lang {
            "mermaid" => Some(Self::Mermaid),
            "plantuml" | "puml" => Some(Self::PlantUml),
            "c4plantuml" => Some(Self::C4PlantUml),
            "graphviz" | "dot" => Some(Self::GraphViz),
            "d2" => Some(Self::D2),
            "ditaa" => Some(Self::Ditaa),
            "erd" => Some(Self::Erd),
            "nomnoml" => Some(Self::Nomnoml),
            "svgbob" => Some(Self::Svgbob),
            "wavedrom" => Some(Self::WaveDrom),
            "blockdiag" => Some(Self::BlockDiag),
            "seqdiag" => Some(Self::SeqDiag),
            _ => None,
        }
    }

    /// Path segment of the Kroki endpoint for this language.
    #[must_use]
    pub fn kroki_endpoint(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::PlantUml => "plantuml",
            Self::C4PlantUml => "c4plantuml",
            Self::GraphViz => "graphviz",
            Self::D2 => "d2",
            Self::Ditaa => "ditaa",
            Self::Erd => "erd",
            Self::Nomnoml => "nomnoml",
            Self::Svgbob => "svgbob",
            Self::WaveDrom => "wavedrom",
            Self::BlockDiag => "blockdiag",
            Self::SeqDiag => "seqdiag",
        }
    }
}

impl fmt::Display for DiagramLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kroki_endpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_prefixed() {
        assert_eq!(DiagramLanguage::parse("mermaid"), Some(DiagramLanguage::Mermaid));
        assert_eq!(
            DiagramLanguage::parse("kroki-mermaid"),
            Some(DiagramLanguage::Mermaid)
        );
        assert_eq!(DiagramLanguage::parse("Mermaid"), Some(DiagramLanguage::Mermaid));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(DiagramLanguage::parse("dot"), Some(DiagramLanguage::GraphViz));
        assert_eq!(DiagramLanguage::parse("puml"), Some(DiagramLanguage::PlantUml));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(DiagramLanguage::parse("rust"), None);
        assert_eq!(DiagramLanguage::parse("kroki-"), None);
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(DiagramLanguage::GraphViz.kroki_endpoint(), "graphviz");
        assert_eq!(DiagramLanguage::D2.to_string(), "d2");
    }
}
