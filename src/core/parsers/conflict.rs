//! Conflict markers inside a file's working-tree content.
//!
//! ```text
//! <<<<<<< HEAD
//! ours
//! ||||||| base        (diff3 style only)
//! base
//! =======
//! theirs
//! >>>>>>> feature
//! ```
//!
//! A region is only reported once its end marker has been seen; unterminated
//! regions are discarded by the splitter and left verbatim by the stripper.

use crate::core::records::ConflictRegion;

const START_MARKER: &str = "<<<<<<<";
const BASE_MARKER: &str = "|||||||";
const DIVIDER_MARKER: &str = "=======";
const END_MARKER: &str = ">>>>>>>";

/// Which side(s) of each region [`remove_conflict_markers`] keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ours,
    Theirs,
    /// Ours followed by theirs
    Both,
}

impl Resolution {
    fn keeps_ours(self) -> bool {
        matches!(self, Resolution::Ours | Resolution::Both)
    }

    fn keeps_theirs(self) -> bool {
        matches!(self, Resolution::Theirs | Resolution::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Ours,
    Base,
    Theirs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Start,
    Base,
    Divider,
    End,
}

fn marker(line: &str) -> Option<Marker> {
    let line = line.trim_end_matches(['\n', '\r']);
    let labelled = |token: &str| {
        line.strip_prefix(token)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    };
    if labelled(START_MARKER) {
        Some(Marker::Start)
    } else if labelled(BASE_MARKER) {
        Some(Marker::Base)
    } else if line == DIVIDER_MARKER {
        Some(Marker::Divider)
    } else if labelled(END_MARKER) {
        Some(Marker::End)
    } else {
        None
    }
}

/// The state transition for one line; `None` means the line is content of the
/// current section.
fn transition(section: Section, marker: Option<Marker>) -> Option<Section> {
    match (section, marker?) {
        (Section::Outside, Marker::Start) => Some(Section::Ours),
        (Section::Ours, Marker::Base) => Some(Section::Base),
        (Section::Ours | Section::Base, Marker::Divider) => Some(Section::Theirs),
        (Section::Theirs, Marker::End) => Some(Section::Outside),
        _ => None,
    }
}

/// Split every complete conflict region into its ours/base/theirs lines.
pub fn parse_conflict_regions(content: &str) -> Vec<ConflictRegion> {
    let mut regions = Vec::new();
    let mut section = Section::Outside;
    let mut current = ConflictRegion::default();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        match transition(section, marker(line)) {
            Some(next) => {
                match next {
                    Section::Ours => {
                        current = ConflictRegion {
                            start_line: line_number,
                            ..Default::default()
                        }
                    }
                    Section::Base => current.base_line = Some(line_number),
                    Section::Theirs => current.divider_line = line_number,
                    Section::Outside => {
                        current.end_line = line_number;
                        regions.push(std::mem::take(&mut current));
                    }
                }
                section = next;
            }
            None => {
                let text = line.to_string();
                match section {
                    Section::Outside => {}
                    Section::Ours => current.ours.push(text),
                    Section::Base => current.base.push(text),
                    Section::Theirs => current.theirs.push(text),
                }
            }
        }
    }

    regions
}

/// Number of complete conflict regions in the content.
pub fn count_conflicts(content: &str) -> usize {
    parse_conflict_regions(content).len()
}

/// Strip conflict markers, keeping the side(s) selected by `resolution`.
///
/// Base sections are always dropped. Text outside regions, including line
/// endings, is kept verbatim. An unterminated region at end of input is emitted
/// unchanged, markers included.
pub fn remove_conflict_markers(content: &str, resolution: Resolution) -> String {
    let mut output = String::with_capacity(content.len());
    let mut section = Section::Outside;
    let mut pending_raw = String::new();
    let mut pending_kept = String::new();

    for line in content.split_inclusive('\n') {
        match transition(section, marker(line)) {
            Some(next) => {
                pending_raw.push_str(line);
                if next == Section::Outside {
                    output.push_str(&pending_kept);
                    pending_raw.clear();
                    pending_kept.clear();
                }
                section = next;
            }
            None => {
                let keep = match section {
                    Section::Outside => {
                        output.push_str(line);
                        continue;
                    }
                    Section::Ours => resolution.keeps_ours(),
                    Section::Base => false,
                    Section::Theirs => resolution.keeps_theirs(),
                };
                pending_raw.push_str(line);
                if keep {
                    pending_kept.push_str(line);
                }
            }
        }
    }

    output.push_str(&pending_raw);
    output
}
