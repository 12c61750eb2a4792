use crate::error::UnknownKeyword;

/// Number of free-form comment lines in a title block
pub const MAX_TITLE_BLOCK_COMMENTS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A,
    B,
    C,
    D,
    E,
    Gerber,
    UsLetter,
    UsLegal,
    UsLedger,
    /// Custom size in millimeters
    User { width: f64, height: f64 },
}

impl TryFrom<&str> for PaperSize {
    type Error = UnknownKeyword;

    /// Named sizes only, `User` needs its dimensions
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "A0" => Ok(Self::A0),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "A3" => Ok(Self::A3),
            "A4" => Ok(Self::A4),
            "A5" => Ok(Self::A5),
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "GERBER" => Ok(Self::Gerber),
            "USLetter" => Ok(Self::UsLetter),
            "USLegal" => Ok(Self::UsLegal),
            "USLedger" => Ok(Self::UsLedger),
            s => Err(UnknownKeyword::new("paper size", s)),
        }
    }
}

impl PaperSize {
    /// Landscape dimensions in millimeters
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match *self {
            PaperSize::A0 => (1189.0, 841.0),
            PaperSize::A1 => (841.0, 594.0),
            PaperSize::A2 => (594.0, 420.0),
            PaperSize::A3 => (420.0, 297.0),
            PaperSize::A4 => (297.0, 210.0),
            PaperSize::A5 => (210.0, 148.0),
            PaperSize::A => (279.4, 215.9),
            PaperSize::B => (431.8, 279.4),
            PaperSize::C => (558.8, 431.8),
            PaperSize::D => (863.6, 558.8),
            PaperSize::E => (1117.6, 863.6),
            PaperSize::Gerber => (812.8, 812.8),
            PaperSize::UsLetter => (279.4, 215.9),
            PaperSize::UsLegal => (355.6, 215.9),
            PaperSize::UsLedger => (431.8, 279.4),
            PaperSize::User { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageInfo {
    pub paper: PaperSize,
    pub portrait: bool,
}

impl PageInfo {
    /// Page dimensions in millimeters with the orientation applied
    pub fn dimensions_mm(&self) -> (f64, f64) {
        let (w, h) = self.paper.dimensions_mm();
        match self.paper {
            PaperSize::User { .. } => (w, h),
            _ if self.portrait => (h, w),
            _ => (w, h),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub revision: String,
    pub company: String,
    pub comments: [String; MAX_TITLE_BLOCK_COMMENTS],
}

impl TitleBlock {
    /// Comment line `n`, counting from 1
    pub fn comment(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.comments.get(i))
            .map(String::as_str)
    }
}
