/// The overlays a map scene can hold, in their draw order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    Aoi,
    Detected,
    Outside,
    ReferenceAoi,
    Results,
}

impl OverlayKind {
    /// Value of the `layer` property in exported scenes.
    pub const fn tag(self) -> &'static str {
        match self {
            OverlayKind::Aoi => "aoi",
            OverlayKind::Detected => "detected",
            OverlayKind::Outside => "outside",
            OverlayKind::ReferenceAoi => "reference_aoi",
            OverlayKind::Results => "results",
        }
    }
}
