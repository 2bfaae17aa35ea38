//! PDF content stream builder.
//!
//! Builds the operator sequence for a page or form XObject. Numbers are
//! written with at most four decimals, so equal inputs give equal bytes.

use super::object_serializer::format_real;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate transformation matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font resource and size (Tf)
    SetFont(String, f32),
    /// Set text matrix (Tm)
    SetTextMatrix(f32, f32, f32, f32, f32, f32),
    /// Set text rise (Ts)
    SetTextRise(f32),
    /// Show a literal string (Tj)
    ShowText(Vec<u8>),
    /// Show text with positioning (TJ)
    ShowTextArray(Vec<TextArrayItem>),
    /// Set fill color RGB (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Set fill color gray (g)
    SetFillColorGray(f32),
    /// Set stroke color gray (G)
    SetStrokeColorGray(f32),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Curve to (c)
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Close path (h)
    ClosePath,
    /// Stroke (S)
    Stroke,
    /// Fill (f)
    Fill,
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Item in a TJ array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextArrayItem {
    /// Literal string bytes
    Text(Vec<u8>),
    /// Bytes written as a hex string
    HexText(Vec<u8>),
    /// Positioning adjustment in thousandths of text space
    /// (negative moves right)
    Adjustment(f32),
}

/// Builder for PDF content streams.
#[derive(Debug, Default, Clone)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    in_text_object: bool,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Recorded operations.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Begin a text object.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End a text object.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Select a font resource.
    pub fn set_font(&mut self, resource: &str, size: f32) -> &mut Self {
        self.op(ContentStreamOp::SetFont(resource.to_string(), size))
    }

    /// Position the text cursor at an absolute baseline origin.
    pub fn text_position(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y))
    }

    /// Set the text rise.
    pub fn text_rise(&mut self, rise: f32) -> &mut Self {
        self.op(ContentStreamOp::SetTextRise(rise))
    }

    /// Show single-byte encoded text at `(x, y)`.
    pub fn text(&mut self, bytes: &[u8], x: f32, y: f32) -> &mut Self {
        self.text_position(x, y)
            .op(ContentStreamOp::ShowText(bytes.to_vec()))
    }

    /// Show a positioned TJ array.
    pub fn text_array(&mut self, items: Vec<TextArrayItem>) -> &mut Self {
        self.op(ContentStreamOp::ShowTextArray(items))
    }

    /// Set the RGB fill color.
    pub fn set_fill_color(&mut self, r: f32, g: f32, b: f32) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(r, g, b))
    }

    /// Set the gray fill color.
    pub fn set_fill_gray(&mut self, gray: f32) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorGray(gray))
    }

    /// Set the gray stroke color.
    pub fn set_stroke_gray(&mut self, gray: f32) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorGray(gray))
    }

    /// Set the line width.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.op(ContentStreamOp::SetLineWidth(width))
    }

    /// Begin a subpath.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x, y))
    }

    /// Append a straight segment.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::LineTo(x, y))
    }

    /// Append a cubic Bézier segment.
    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> &mut Self {
        self.op(ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3))
    }

    /// Append a rectangle subpath.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height))
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) -> &mut Self {
        self.op(ContentStreamOp::ClosePath)
    }

    /// Stroke the path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Fill the path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Draw a straight stroked line.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> &mut Self {
        self.move_to(x1, y1).line_to(x2, y2).stroke()
    }

    /// Append a circle subpath approximated by four Bézier curves.
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        // 4/3 * (sqrt(2) - 1)
        let k = 0.552_284_8;
        let c = radius * k;

        self.move_to(cx + radius, cy)
            .curve_to(cx + radius, cy + c, cx + c, cy + radius, cx, cy + radius)
            .curve_to(cx - c, cy + radius, cx - radius, cy + c, cx - radius, cy)
            .curve_to(cx - radius, cy - c, cx - c, cy - radius, cx, cy - radius)
            .curve_to(cx + c, cy - radius, cx + radius, cy - c, cx + radius, cy)
            .close_path()
    }

    /// Rounded rectangle built from rectangle and circle subpaths.
    ///
    /// Two overlapping rectangles cover the body minus the corner strips and a
    /// circle of `radius` sits on each corner. All subpaths wind the same way,
    /// so a nonzero fill paints their union.
    pub fn rounded_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) -> &mut Self {
        let r = radius.min(width / 2.0).min(height / 2.0);
        if r <= 0.0 {
            return self.rect(x, y, width, height);
        }
        self.rect(x + r, y, width - 2.0 * r, height)
            .rect(x, y + r, width, height - 2.0 * r)
            .circle(x + r, y + r, r)
            .circle(x + width - r, y + r, r)
            .circle(x + r, y + height - r, r)
            .circle(x + width - r, y + height - r, r)
    }

    /// Save graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// Restore graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::RestoreState)
    }

    /// Concatenate a matrix onto the CTM.
    pub fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> &mut Self {
        self.op(ContentStreamOp::Transform(a, b, c, d, e, f))
    }

    /// Paint an XObject scaled by `(sx, sy)` with its origin at `(x, y)`,
    /// isolated in its own graphics state.
    pub fn draw_xobject(&mut self, name: &str, x: f32, y: f32, sx: f32, sy: f32) -> &mut Self {
        self.save_state()
            .transform(sx, 0.0, 0.0, sy, x, y)
            .op(ContentStreamOp::PaintXObject(name.to_string()))
            .restore_state()
    }

    /// Serialize the operations, one per line.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op);
            buf.push(b'\n');
        }
        buf
    }
}

fn num(w: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        w.extend_from_slice(format_real(f64::from(*v)).as_bytes());
        w.push(b' ');
    }
}

fn tail(w: &mut Vec<u8>, operator: &str) {
    w.extend_from_slice(operator.as_bytes());
}

fn write_op(w: &mut Vec<u8>, op: &ContentStreamOp) {
    match op {
        ContentStreamOp::SaveState => tail(w, "q"),
        ContentStreamOp::RestoreState => tail(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f) => {
            num(w, &[*a, *b, *c, *d, *e, *f]);
            tail(w, "cm")
        },
        ContentStreamOp::BeginText => tail(w, "BT"),
        ContentStreamOp::EndText => tail(w, "ET"),
        ContentStreamOp::SetFont(name, size) => {
            w.push(b'/');
            w.extend_from_slice(name.as_bytes());
            w.push(b' ');
            num(w, &[*size]);
            tail(w, "Tf")
        },
        ContentStreamOp::SetTextMatrix(a, b, c, d, e, f) => {
            num(w, &[*a, *b, *c, *d, *e, *f]);
            tail(w, "Tm")
        },
        ContentStreamOp::SetTextRise(rise) => {
            num(w, &[*rise]);
            tail(w, "Ts")
        },
        ContentStreamOp::ShowText(bytes) => {
            write_literal(w, bytes);
            tail(w, " Tj")
        },
        ContentStreamOp::ShowTextArray(items) => {
            w.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    w.push(b' ');
                }
                match item {
                    TextArrayItem::Text(bytes) => write_literal(w, bytes),
                    TextArrayItem::HexText(bytes) => write_hex(w, bytes),
                    TextArrayItem::Adjustment(adj) => {
                        w.extend_from_slice(format_real(f64::from(*adj)).as_bytes())
                    },
                }
            }
            tail(w, "] TJ")
        },
        ContentStreamOp::SetFillColorRGB(r, g, b) => {
            num(w, &[*r, *g, *b]);
            tail(w, "rg")
        },
        ContentStreamOp::SetFillColorGray(g) => {
            num(w, &[*g]);
            tail(w, "g")
        },
        ContentStreamOp::SetStrokeColorGray(g) => {
            num(w, &[*g]);
            tail(w, "G")
        },
        ContentStreamOp::SetLineWidth(width) => {
            num(w, &[*width]);
            tail(w, "w")
        },
        ContentStreamOp::MoveTo(x, y) => {
            num(w, &[*x, *y]);
            tail(w, "m")
        },
        ContentStreamOp::LineTo(x, y) => {
            num(w, &[*x, *y]);
            tail(w, "l")
        },
        ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
            num(w, &[*x1, *y1, *x2, *y2, *x3, *y3]);
            tail(w, "c")
        },
        ContentStreamOp::Rectangle(x, y, width, height) => {
            num(w, &[*x, *y, *width, *height]);
            tail(w, "re")
        },
        ContentStreamOp::ClosePath => tail(w, "h"),
        ContentStreamOp::Stroke => tail(w, "S"),
        ContentStreamOp::Fill => tail(w, "f"),
        ContentStreamOp::PaintXObject(name) => {
            w.push(b'/');
            w.extend_from_slice(name.as_bytes());
            tail(w, " Do")
        },
    }
}

fn write_literal(w: &mut Vec<u8>, bytes: &[u8]) {
    w.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' => w.extend_from_slice(b"\\("),
            b')' => w.extend_from_slice(b"\\)"),
            b'\\' => w.extend_from_slice(b"\\\\"),
            b'\n' => w.extend_from_slice(b"\\n"),
            b'\r' => w.extend_from_slice(b"\\r"),
            _ => w.push(byte),
        }
    }
    w.push(b')');
}

fn write_hex(w: &mut Vec<u8>, bytes: &[u8]) {
    w.push(b'<');
    for byte in bytes {
        w.extend_from_slice(format!("{:02X}", byte).as_bytes());
    }
    w.push(b'>');
}
