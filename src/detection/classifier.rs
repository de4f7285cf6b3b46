/// Gesture classification from fingertip heights
///
/// Compares the y coordinate of each fingertip against the thumb tip
/// (smaller y is higher in the frame).
use super::detector::{landmarks, HandLandmarks};
use crate::game::Gesture;

/// Classify a hand as Rock, Paper or Scissors.
///
/// - all four fingertips above the thumb tip: Paper
/// - index and middle above, ring and pinky below: Scissors
/// - anything else: Rock
pub fn classify_hand_shape(hand: &HandLandmarks) -> Gesture {
    let thumb = hand.get(landmarks::THUMB_TIP).y;
    let index = hand.get(landmarks::INDEX_FINGER_TIP).y;
    let middle = hand.get(landmarks::MIDDLE_FINGER_TIP).y;
    let ring = hand.get(landmarks::RING_FINGER_TIP).y;
    let pinky = hand.get(landmarks::PINKY_TIP).y;

    if index < thumb && middle < thumb && ring < thumb && pinky < thumb {
        Gesture::Paper
    } else if index < thumb && middle < thumb && ring > thumb && pinky > thumb {
        Gesture::Scissors
    } else {
        Gesture::Rock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detector::Landmark;

    fn hand(thumb: f32, index: f32, middle: f32, ring: f32, pinky: f32) -> HandLandmarks {
        let mut points = [Landmark::new(0.5, 0.9, 0.0); landmarks::COUNT];
        points[landmarks::THUMB_TIP].y = thumb;
        points[landmarks::INDEX_FINGER_TIP].y = index;
        points[landmarks::MIDDLE_FINGER_TIP].y = middle;
        points[landmarks::RING_FINGER_TIP].y = ring;
        points[landmarks::PINKY_TIP].y = pinky;
        HandLandmarks::new(points)
    }

    #[test]
    fn test_all_fingers_up_is_paper() {
        assert_eq!(classify_hand_shape(&hand(0.6, 0.2, 0.1, 0.2, 0.3)), Gesture::Paper);
    }

    #[test]
    fn test_two_fingers_up_is_scissors() {
        assert_eq!(classify_hand_shape(&hand(0.5, 0.2, 0.1, 0.7, 0.8)), Gesture::Scissors);
    }

    #[test]
    fn test_all_fingers_down_is_rock() {
        assert_eq!(classify_hand_shape(&hand(0.4, 0.6, 0.6, 0.7, 0.7)), Gesture::Rock);
    }

    #[test]
    fn test_other_configurations_fall_back_to_rock() {
        // Three fingers up
        assert_eq!(classify_hand_shape(&hand(0.5, 0.2, 0.2, 0.2, 0.8)), Gesture::Rock);
        // Only the index finger up
        assert_eq!(classify_hand_shape(&hand(0.5, 0.2, 0.7, 0.7, 0.7)), Gesture::Rock);
        // Ring level with the thumb is neither above nor below
        assert_eq!(classify_hand_shape(&hand(0.5, 0.2, 0.2, 0.5, 0.8)), Gesture::Rock);
    }

    #[test]
    fn test_equal_heights_are_not_above() {
        assert_eq!(classify_hand_shape(&hand(0.5, 0.5, 0.5, 0.5, 0.5)), Gesture::Rock);
    }
}
