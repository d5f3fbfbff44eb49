/// One piece of a decomposed statement.
///
/// A decomposition always starts and ends with `Text` and alternates
/// `Text, Parameter, Text, ...`; text pieces may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal SQL emitted verbatim.
    Text(String),
    /// Position where a bound value is substituted.
    Parameter,
}

impl Segment {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parameter => None,
        }
    }
}

pub fn parameter_count(segments: &[Segment]) -> usize {
    segments.iter().filter(|s| s.is_parameter()).count()
}

/// Join all text, writing `placeholder` for each parameter.
/// With `"?"` this reproduces the analyzed input exactly.
pub fn reassemble(segments: &[Segment], placeholder: &str) -> String {
    let mut result = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => result.push_str(text),
            Segment::Parameter => result.push_str(placeholder),
        }
    }
    result
}

/// Append the segments to `out`, substituting `values` in order.
/// Callers check that there is one value per parameter.
pub(crate) fn render_into<S: AsRef<str>>(segments: &[Segment], values: &[S], out: &mut String) {
    let mut values = values.iter();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Parameter => {
                if let Some(value) = values.next() {
                    out.push_str(value.as_ref());
                }
            }
        }
    }
}

/// Byte length `render_into` would append.
pub(crate) fn rendered_len<S: AsRef<str>>(segments: &[Segment], values: &[S]) -> usize {
    let text: usize = segments.iter().filter_map(Segment::text).map(str::len).sum();
    let bound: usize = values.iter().map(|v| v.as_ref().len()).sum();
    text + bound
}
