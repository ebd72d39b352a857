diesel::table! {
    users (id) {
        id -> BigInt,
        username -> Text,
        password_hash -> Text,
        role -> Text,
        display_name -> Nullable<Text>,
    }
}

diesel::table! {
    courses (id) {
        id -> BigInt,
        name -> Text,
        semester -> Text,
        teacher_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    enrollments (id) {
        id -> BigInt,
        user_id -> BigInt,
        course_id -> BigInt,
    }
}

diesel::table! {
    attendance (id) {
        id -> BigInt,
        enrollment_id -> BigInt,
        date -> Text,
        status -> Text,
    }
}

diesel::table! {
    grades (id) {
        id -> BigInt,
        enrollment_id -> BigInt,
        category -> Text,
        grade_value -> Text,
    }
}

diesel::table! {
    course_resources (id) {
        id -> BigInt,
        course_id -> BigInt,
        file_name -> Text,
        file_path -> Text,
    }
}

diesel::table! {
    sessions (id) {
        id -> BigInt,
        token -> Text,
        user_id -> BigInt,
        created_at -> Text,
    }
}

diesel::joinable!(courses -> users (teacher_id));
diesel::joinable!(enrollments -> courses (course_id));
diesel::joinable!(enrollments -> users (user_id));
diesel::joinable!(attendance -> enrollments (enrollment_id));
diesel::joinable!(grades -> enrollments (enrollment_id));
diesel::joinable!(course_resources -> courses (course_id));
diesel::joinable!(sessions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    courses,
    enrollments,
    attendance,
    grades,
    course_resources,
    sessions,
);
