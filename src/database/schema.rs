// Copyright 2023 Remi Bernotavicius

diesel::table! {
    #[sql_name = "Tiempos"]
    meal_times (id) {
        id -> Integer,
        #[sql_name = "Nombre"]
        name -> Text,
    }
}

diesel::table! {
    #[sql_name = "TipoIngrediente"]
    ingredient_categories (id) {
        id -> Integer,
        #[sql_name = "nombre"]
        name -> Text,
        color -> Text,
    }
}

diesel::table! {
    #[sql_name = "Ingredientes"]
    ingredients (id) {
        id -> Integer,
        #[sql_name = "nombre"]
        name -> Text,
        #[sql_name = "tipo_id"]
        category_id -> Nullable<Integer>,
    }
}

diesel::table! {
    #[sql_name = "Recetas"]
    recipes (id) {
        id -> Integer,
        #[sql_name = "nombre"]
        name -> Text,
        #[sql_name = "TiempoId"]
        meal_time_id -> Integer,
        #[sql_name = "tiempo_preparacion"]
        prep_time -> Text,
        #[sql_name = "calorias"]
        calories -> Integer,
        #[sql_name = "imagen"]
        image_path -> Text,
        link -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "RecetaIngredientes"]
    recipe_ingredients (id) {
        id -> Integer,
        #[sql_name = "RecetaId"]
        recipe_id -> Integer,
        #[sql_name = "IngredienteId"]
        ingredient_id -> Integer,
    }
}

diesel::table! {
    #[sql_name = "Pacientes"]
    patients (id) {
        id -> Integer,
        #[sql_name = "nombre"]
        name -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "PacienteIngredientesEvitar"]
    patient_avoid_ingredients (id) {
        id -> Integer,
        #[sql_name = "PacienteId"]
        patient_id -> Integer,
        #[sql_name = "IngredienteId"]
        ingredient_id -> Integer,
    }
}

diesel::table! {
    #[sql_name = "Menus"]
    menus (id) {
        id -> Integer,
        #[sql_name = "idPaciente"]
        patient_id -> Integer,
        #[sql_name = "nombre"]
        name -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    #[sql_name = "MenuTiempos"]
    menu_slots (id) {
        id -> Integer,
        #[sql_name = "idMenu"]
        menu_id -> Integer,
        #[sql_name = "idTiempos"]
        meal_time_id -> Integer,
        #[sql_name = "orden"]
        position -> Integer,
    }
}

diesel::table! {
    #[sql_name = "MenuPaciente"]
    menu_items (id) {
        id -> Integer,
        #[sql_name = "idPaciente"]
        patient_id -> Integer,
        #[sql_name = "idMenu"]
        menu_id -> Nullable<Integer>,
        #[sql_name = "idTiempos"]
        meal_time_id -> Integer,
        #[sql_name = "idTipoIngrediente"]
        category_id -> Nullable<Integer>,
        #[sql_name = "Codigo"]
        code -> Nullable<Integer>,
        #[sql_name = "Cantidad"]
        quantity -> Nullable<Double>,
        #[sql_name = "Nombre"]
        name -> Text,
        #[sql_name = "RecipeTitle"]
        recipe_title -> Nullable<Text>,
    }
}

diesel::joinable!(ingredients -> ingredient_categories (category_id));
diesel::joinable!(recipes -> meal_times (meal_time_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(patient_avoid_ingredients -> ingredients (ingredient_id));
diesel::joinable!(patient_avoid_ingredients -> patients (patient_id));
diesel::joinable!(menus -> patients (patient_id));
diesel::joinable!(menu_slots -> meal_times (meal_time_id));
diesel::joinable!(menu_slots -> menus (menu_id));
diesel::joinable!(menu_items -> meal_times (meal_time_id));
diesel::joinable!(menu_items -> ingredient_categories (category_id));
diesel::joinable!(menu_items -> patients (patient_id));
diesel::joinable!(menu_items -> menus (menu_id));

diesel::allow_tables_to_appear_in_same_query!(
    ingredient_categories,
    ingredients,
    meal_times,
    menu_items,
    menu_slots,
    menus,
    patient_avoid_ingredients,
    patients,
    recipe_ingredients,
    recipes,
);
