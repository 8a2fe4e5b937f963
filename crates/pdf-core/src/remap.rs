//! In-place color remapping of content streams
//!
//! Text objects are forced to the text color while every other painting
//! operator keeps the colors it had. The original color state is tracked
//! through `q`/`Q` and restored after each `ET`, so graphics drawn after a
//! text object are unaffected by the rewrite.
//!
//! A form XObject inherits the colors of whatever draws it. When a form's
//! text object runs before the form has set a color of its own, there is
//! nothing to restore explicitly, so the text object is wrapped in `q`/`Q`
//! and the text state it changed is replayed after the `Q`.

use crate::color::Color;
use crate::font::number;
use crate::PageBox;
use lopdf::content::Operation;
use lopdf::Object;
use std::ops::AddAssign;

/// Fraction of the page a white rectangle must cover to count as a page fill
const PAGE_FILL_COVERAGE: f64 = 0.9;

/// How close to 1.0 every channel must be for a fill to count as white
const WHITE_TOLERANCE: f32 = 0.02;

const COLOR_OPERATORS: &[&str] = &["g", "G", "rg", "RG", "k", "K", "cs", "CS", "sc", "SC", "scn", "SCN"];
const PATH_CONSTRUCTION: &[&str] = &["m", "l", "c", "v", "y", "h", "re"];
const PATH_PAINTING: &[&str] = &["S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n"];
const FILL_OPERATORS: &[&str] = &["f", "F", "f*"];
/// Text state survives `ET` but not `Q`
const TEXT_STATE_OPERATORS: &[&str] = &["Tf", "Tc", "Tw", "Tz", "TL", "Ts", "Tr"];

/// Where a content stream is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamKind {
    /// Page content, starting from the default graphics state
    Page(PageBox),
    /// Form XObject content, starting from the caller's graphics state
    Form,
}

/// Target colors for a remap pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemapColors {
    pub background: Color,
    pub text: Color,
    /// Repaint page-sized white rectangles in the background color
    pub replace_page_fills: bool,
}

/// Counters describing what a remap pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapStats {
    pub text_objects: usize,
    pub colors_replaced: usize,
    pub page_fills_replaced: usize,
    pub forms_rewritten: usize,
    pub pages_skipped: usize,
}

impl AddAssign for RemapStats {
    fn add_assign(&mut self, rhs: Self) {
        self.text_objects += rhs.text_objects;
        self.colors_replaced += rhs.colors_replaced;
        self.page_fills_replaced += rhs.page_fills_replaced;
        self.forms_rewritten += rhs.forms_rewritten;
        self.pages_skipped += rhs.pages_skipped;
    }
}

/// Original color operators for one of fill or stroke
#[derive(Debug, Clone, Default)]
struct ColorSlot {
    space: Option<Operation>,
    color: Option<Operation>,
}

impl ColorSlot {
    fn is_set(&self) -> bool {
        self.space.is_some() || self.color.is_some()
    }

    /// Operators that reinstate this slot
    ///
    /// A slot never set in a page stream is DeviceGray black. In a form it is
    /// whatever the caller had, which only a `Q` can bring back, so nothing
    /// is emitted.
    fn restore(&self, gray_operator: &str, inherited: bool) -> Vec<Operation> {
        if !self.is_set() {
            if inherited {
                return Vec::new();
            }
            return vec![Operation::new(gray_operator, vec![Object::Integer(0)])];
        }
        self.space.iter().chain(self.color.iter()).cloned().collect()
    }

    fn current(&self) -> Option<Color> {
        let color = self.color.as_ref()?;
        let components: Vec<f32> = color.operands.iter().filter_map(number).collect();
        match color.operator.as_str() {
            "g" | "G" | "rg" | "RG" | "k" | "K" => Color::from_components(&components),
            _ => {
                let device = match self.space.as_ref().and_then(|s| s.operands.first()) {
                    Some(Object::Name(name)) => {
                        matches!(name.as_slice(), b"DeviceGray" | b"DeviceRGB" | b"DeviceCMYK")
                    }
                    // sc without cs applies to the initial DeviceGray space
                    _ => self.space.is_none(),
                };
                if device {
                    Color::from_components(&components)
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ColorState {
    fill: ColorSlot,
    stroke: ColorSlot,
}

impl ColorState {
    fn apply(&mut self, op: &Operation) {
        let slot = match op.operator.as_str() {
            "g" | "rg" | "k" | "cs" | "sc" | "scn" => &mut self.fill,
            _ => &mut self.stroke,
        };
        match op.operator.as_str() {
            "cs" | "CS" => {
                slot.space = Some(op.clone());
                slot.color = None;
            }
            "sc" | "scn" | "SC" | "SCN" => slot.color = Some(op.clone()),
            _ => {
                slot.space = None;
                slot.color = Some(op.clone());
            }
        }
    }

    fn is_known(&self) -> bool {
        self.fill.is_set() && self.stroke.is_set()
    }

    fn restore_ops(&self, inherited: bool) -> Vec<Operation> {
        let mut ops = self.fill.restore("g", inherited);
        ops.extend(self.stroke.restore("G", inherited));
        ops
    }
}

/// Rewrite one content stream's operations
///
/// Page-fill replacement only applies to [`StreamKind::Page`]; a form's
/// coordinate space is not the page's.
pub fn remap_operations(
    ops: Vec<Operation>,
    colors: &RemapColors,
    kind: StreamKind,
) -> (Vec<Operation>, RemapStats) {
    let mut out = Vec::with_capacity(ops.len() + 8);
    let mut stats = RemapStats::default();
    let mut state = ColorState::default();
    let mut saved: Vec<ColorState> = Vec::new();
    let mut in_text = false;
    let mut path_open = false;
    let mut pending_rect: Option<Operation> = None;
    // Set while inside a text object wrapped in q/Q; holds its text state
    let mut bracketed: Option<Vec<Operation>> = None;

    let inherited = kind == StreamKind::Form;
    let fill_box = match kind {
        StreamKind::Page(page_box) if colors.replace_page_fills => Some(page_box),
        _ => None,
    };

    for op in ops {
        if let Some(rect) = pending_rect.take() {
            let covers = fill_box.is_some_and(|b| covers_page(&rect, &b));
            if FILL_OPERATORS.contains(&op.operator.as_str())
                && covers
                && state.fill.current().is_some_and(|c| c.is_white(WHITE_TOLERANCE))
            {
                out.push(Operation::new("q", vec![]));
                out.push(colors.background.fill_operation());
                out.push(rect);
                out.push(op);
                out.push(Operation::new("Q", vec![]));
                stats.page_fills_replaced += 1;
                path_open = false;
                continue;
            }
            out.push(rect);
        }

        let operator = op.operator.as_str();
        match operator {
            "q" => {
                saved.push(state.clone());
                out.push(op);
            }
            "Q" => {
                if let Some(previous) = saved.pop() {
                    state = previous;
                }
                out.push(op);
            }
            "BT" => {
                in_text = true;
                stats.text_objects += 1;
                if inherited && !state.is_known() {
                    out.push(Operation::new("q", vec![]));
                    bracketed = Some(Vec::new());
                }
                out.push(op);
                out.push(colors.text.fill_operation());
                out.push(colors.text.stroke_operation());
            }
            "ET" => {
                in_text = false;
                out.push(op);
                if let Some(text_state) = bracketed.take() {
                    out.push(Operation::new("Q", vec![]));
                    out.extend(text_state);
                }
                out.extend(state.restore_ops(inherited));
            }
            _ if in_text && TEXT_STATE_OPERATORS.contains(&operator) => {
                if let Some(text_state) = bracketed.as_mut() {
                    text_state.retain(|o| o.operator != op.operator);
                    text_state.push(op.clone());
                }
                out.push(op);
            }
            "re" if fill_box.is_some() && !in_text && !path_open => {
                path_open = true;
                pending_rect = Some(op);
            }
            _ if COLOR_OPERATORS.contains(&operator) => {
                state.apply(&op);
                if in_text {
                    stats.colors_replaced += 1;
                } else {
                    out.push(op);
                }
            }
            _ => {
                if PATH_CONSTRUCTION.contains(&operator) {
                    path_open = true;
                } else if PATH_PAINTING.contains(&operator) {
                    path_open = false;
                }
                out.push(op);
            }
        }
    }

    if let Some(rect) = pending_rect {
        out.push(rect);
    }

    (out, stats)
}

fn covers_page(rect: &Operation, page_box: &PageBox) -> bool {
    let dims: Vec<f64> = rect
        .operands
        .iter()
        .filter_map(number)
        .map(f64::from)
        .collect();
    if dims.len() != 4 {
        return false;
    }
    let page_area = page_box.width() * page_box.height();
    page_area > 0.0 && (dims[2] * dims[3]).abs() >= page_area * PAGE_FILL_COVERAGE
}
