use cogex_core::Screen;

/// Output side of a running task. Issuing a screen must not block on the participant.
pub trait Presenter {
    fn present(&mut self, screen: Screen);
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(&mut self, screen: Screen) {
        (**self).present(screen)
    }
}
